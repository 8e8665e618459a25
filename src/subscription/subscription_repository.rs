use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::subscription_models::{PushSubscription, SubscriptionKeys};
use crate::error::Result;

/// Storage contract for push subscriptions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persists a new subscription. Endpoints are not deduplicated.
    async fn register(
        &self,
        user_id: Option<Uuid>,
        endpoint: &str,
        keys: &SubscriptionKeys,
    ) -> Result<PushSubscription>;

    /// Fan-out set for a notification: the user's subscriptions, or every
    /// subscription when `user_id` is `None`.
    async fn find_targets(&self, user_id: Option<Uuid>) -> Result<Vec<PushSubscription>>;
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn register(
        &self,
        user_id: Option<Uuid>,
        endpoint: &str,
        keys: &SubscriptionKeys,
    ) -> Result<PushSubscription> {
        let subscription = sqlx::query_as::<_, PushSubscription>(
            "INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
             VALUES ($1, $2, $3, $4)
             RETURNING *"
        )
        .bind(user_id)
        .bind(endpoint)
        .bind(&keys.p256dh)
        .bind(&keys.auth)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn find_targets(&self, user_id: Option<Uuid>) -> Result<Vec<PushSubscription>> {
        let subscriptions = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, PushSubscription>(
                    "SELECT * FROM push_subscriptions WHERE user_id = $1"
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PushSubscription>("SELECT * FROM push_subscriptions")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(subscriptions)
    }
}
