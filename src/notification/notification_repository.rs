use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::notification_models::{Notification, NotificationFilter, NotificationStatus};
use crate::error::{AppError, Result};

/// Storage contract for notification records. Every call is a single atomic
/// statement; `status` is the only column that changes after insert.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(
        &self,
        user_id: Option<Uuid>,
        title: &str,
        description: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Notification>;

    async fn get(&self, id: Uuid) -> Result<Notification>;

    async fn list(&self, filter: &NotificationFilter) -> Result<Vec<Notification>>;

    /// Last write wins. Returns `false` if the record no longer exists.
    async fn mark_status(&self, id: Uuid, status: NotificationStatus) -> Result<bool>;

    /// Pending records whose `scheduled_at` is set and not after `now`.
    async fn due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Notification not found".to_string())
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(
        &self,
        user_id: Option<Uuid>,
        title: &str,
        description: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, title, description, status, scheduled_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *"
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(NotificationStatus::Pending)
        .bind(scheduled_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Notification> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    async fn list(&self, filter: &NotificationFilter) -> Result<Vec<Notification>> {
        let mut query = "SELECT * FROM notifications WHERE TRUE".to_string();
        let mut params_count = 0;

        if filter.user_id.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND user_id = ${}", params_count));
        }

        if filter.status.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND status = ${}", params_count));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut db_query = sqlx::query_as::<_, Notification>(&query);

        if let Some(user_id) = filter.user_id {
            db_query = db_query.bind(user_id);
        }

        if let Some(status) = filter.status {
            db_query = db_query.bind(status);
        }

        let notifications = db_query.fetch_all(&self.pool).await?;
        Ok(notifications)
    }

    async fn mark_status(&self, id: Uuid, status: NotificationStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE status = $1
             AND scheduled_at IS NOT NULL
             AND scheduled_at <= $2
             ORDER BY scheduled_at ASC"
        )
        .bind(NotificationStatus::Pending)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        Ok(())
    }
}
