use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    /// `Sent` and `Failed` are final; a record in either state is never
    /// dispatched again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, NotificationStatus::Pending)
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "PENDING"),
            NotificationStatus::Sent => write!(f, "SENT"),
            NotificationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One logical message. `user_id = None` broadcasts to every subscription;
/// `scheduled_at = None` means deliver immediately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_broadcast(&self) -> bool {
        self.user_id.is_none()
    }

    /// Due once `scheduled_at` has passed while still pending. Immediate
    /// notifications are never due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Pending
            && self.scheduled_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<NotificationStatus>,
}

/// Body delivered to the browser.
#[derive(Debug, Serialize)]
pub struct PushPayload<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a Notification> for PushPayload<'a> {
    fn from(notification: &'a Notification) -> Self {
        Self {
            title: &notification.title,
            description: &notification.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn notification(status: NotificationStatus, scheduled_at: Option<DateTime<Utc>>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: None,
            title: "Maintenance".to_string(),
            description: "Warehouse closes at 18:00".to_string(),
            status,
            created_at: Utc::now(),
            scheduled_at,
        }
    }

    #[test]
    fn test_notification_status_display() {
        assert_eq!(NotificationStatus::Pending.to_string(), "PENDING");
        assert_eq!(NotificationStatus::Sent.to_string(), "SENT");
        assert_eq!(NotificationStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!NotificationStatus::Pending.is_terminal());
        assert!(NotificationStatus::Sent.is_terminal());
        assert!(NotificationStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(NotificationStatus::Sent).unwrap(),
            serde_json::json!("SENT")
        );
        let status: NotificationStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(status, NotificationStatus::Failed);
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        let past = Some(now - Duration::minutes(1));
        let future = Some(now + Duration::hours(1));

        assert!(notification(NotificationStatus::Pending, past).is_due(now));
        assert!(notification(NotificationStatus::Pending, Some(now)).is_due(now));
        assert!(!notification(NotificationStatus::Pending, future).is_due(now));
        assert!(!notification(NotificationStatus::Pending, None).is_due(now));
        assert!(!notification(NotificationStatus::Sent, past).is_due(now));
        assert!(!notification(NotificationStatus::Failed, past).is_due(now));
    }

    #[test]
    fn test_payload_contains_only_title_and_description() {
        let n = notification(NotificationStatus::Pending, None);
        let json = serde_json::to_value(PushPayload::from(&n)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "title": "Maintenance",
                "description": "Warehouse closes at 18:00"
            })
        );
    }

    #[test]
    fn test_notification_serializes_camel_case() {
        let n = notification(NotificationStatus::Pending, None);
        let json = serde_json::to_value(&n).unwrap();

        assert!(json.get("createdAt").is_some());
        assert!(json.get("scheduledAt").is_some());
        assert_eq!(json["status"], "PENDING");
        assert!(n.is_broadcast());
    }
}
