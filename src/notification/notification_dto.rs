use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::notification_models::{NotificationFilter, NotificationStatus};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// Target user; omit to broadcast to every subscription.
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleNotificationRequest {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    /// ISO 8601 delivery time
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListNotificationsQuery {
    /// Only notifications targeted at this user
    pub user_id: Option<Uuid>,
    /// PENDING, SENT or FAILED
    pub status: Option<NotificationStatus>,
}

impl From<ListNotificationsQuery> for NotificationFilter {
    fn from(query: ListNotificationsQuery) -> Self {
        Self {
            user_id: query.user_id,
            status: query.status,
        }
    }
}
