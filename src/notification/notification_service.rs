use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::dispatcher::NotificationDispatcher;
use super::notification_models::{Notification, NotificationFilter};
use super::notification_repository::NotificationStore;
use crate::error::Result;
use crate::subscription::{PushSubscription, SubscriptionKeys, SubscriptionStore};

/// Service layer behind the notification API.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    dispatcher: NotificationDispatcher,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            notifications,
            subscriptions,
            dispatcher,
        }
    }

    pub async fn subscribe(
        &self,
        user_id: Option<Uuid>,
        endpoint: &str,
        keys: SubscriptionKeys,
    ) -> Result<PushSubscription> {
        let subscription = self.subscriptions.register(user_id, endpoint, &keys).await?;
        info!(
            subscription_id = %subscription.id,
            user_id = ?user_id,
            endpoint,
            "Subscribed to notifications"
        );
        Ok(subscription)
    }

    /// Creates the record and dispatches it before returning. The returned
    /// notification carries the terminal status of that attempt.
    pub async fn send_now(
        &self,
        user_id: Option<Uuid>,
        title: &str,
        description: &str,
    ) -> Result<Notification> {
        let notification = self
            .notifications
            .create(user_id, title, description, None)
            .await?;

        let report = self.dispatcher.dispatch(&notification).await?;

        Ok(Notification {
            status: report.status,
            ..notification
        })
    }

    pub async fn schedule(
        &self,
        user_id: Option<Uuid>,
        title: &str,
        description: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Notification> {
        let notification = self
            .notifications
            .create(user_id, title, description, Some(scheduled_at))
            .await?;

        info!(
            notification_id = %notification.id,
            user_id = ?user_id,
            %scheduled_at,
            "Scheduled notification"
        );
        Ok(notification)
    }

    pub async fn list(&self, filter: NotificationFilter) -> Result<Vec<Notification>> {
        self.notifications.list(&filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Notification> {
        self.notifications.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.notifications.delete(id).await
    }
}
