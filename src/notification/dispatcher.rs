//! Fan-out delivery of a single notification.
//!
//! A dispatch attempt resolves the fan-out set, pushes to every subscription
//! independently, folds the per-subscriber outcomes into one status with
//! [`aggregate_status`] and persists it. Individual delivery failures are
//! data, not errors: only storage failures escape [`NotificationDispatcher::dispatch`],
//! and they leave the record `PENDING`.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::notification_models::{Notification, NotificationStatus, PushPayload};
use super::notification_repository::{not_found, NotificationStore};
use crate::error::{AppError, Result};
use crate::push::{PushError, PushSender};
use crate::subscription::{PushSubscription, SubscriptionStore};

/// Result of pushing to one subscription.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub subscription_id: Uuid,
    pub endpoint: String,
    pub result: std::result::Result<(), PushError>,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// `Sent` iff at least one subscription was targeted and every push
/// succeeded. Partial delivery is `Failed`.
pub fn aggregate_status(outcomes: &[DeliveryOutcome]) -> NotificationStatus {
    if !outcomes.is_empty() && outcomes.iter().all(DeliveryOutcome::is_delivered) {
        NotificationStatus::Sent
    } else {
        NotificationStatus::Failed
    }
}

#[derive(Debug)]
pub struct DispatchReport {
    pub notification_id: Uuid,
    pub status: NotificationStatus,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }

    pub fn gone(&self) -> usize {
        self.expired().count()
    }

    /// Outcomes whose endpoint has expired at the push service.
    pub fn expired(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Err(e) if e.is_gone()))
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    sender: Arc<dyn PushSender>,
    concurrency: usize,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        sender: Arc<dyn PushSender>,
        concurrency: usize,
    ) -> Self {
        Self {
            notifications,
            subscriptions,
            sender,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn dispatch(&self, notification: &Notification) -> Result<DispatchReport> {
        if notification.status.is_terminal() {
            debug!(
                notification_id = %notification.id,
                status = %notification.status,
                "Notification already finished, skipping dispatch"
            );
            return Ok(DispatchReport {
                notification_id: notification.id,
                status: notification.status,
                outcomes: Vec::new(),
            });
        }

        let targets = self.subscriptions.find_targets(notification.user_id).await?;
        if targets.is_empty() {
            warn!(
                notification_id = %notification.id,
                user_id = ?notification.user_id,
                broadcast = notification.is_broadcast(),
                "No subscriptions found for notification"
            );
        }

        let payload = serde_json::to_vec(&PushPayload::from(notification)).map_err(|e| {
            error!("Failed to serialize push payload: {:?}", e);
            AppError::InternalError
        })?;
        let payload = payload.as_slice();
        let notification_id = notification.id;

        let outcomes: Vec<DeliveryOutcome> = stream::iter(targets)
            .map(|subscription| async move {
                self.deliver(notification_id, &subscription, payload).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let report = DispatchReport {
            notification_id: notification.id,
            status: aggregate_status(&outcomes),
            outcomes,
        };

        let updated = self
            .notifications
            .mark_status(notification.id, report.status)
            .await?;
        if !updated {
            warn!(
                notification_id = %notification.id,
                delivered = report.delivered(),
                "Notification was deleted while it was being dispatched"
            );
            return Err(not_found());
        }

        if report.gone() > 0 {
            // TODO: prune expired subscriptions once a retention policy for dead endpoints exists
            let expired: Vec<String> = report
                .expired()
                .map(|o| format!("{} ({})", o.subscription_id, o.endpoint))
                .collect();
            warn!(
                notification_id = %notification.id,
                ?expired,
                "Push endpoints expired"
            );
        }

        info!(
            notification_id = %notification.id,
            status = %report.status,
            targets = report.outcomes.len(),
            delivered = report.delivered(),
            failed = report.failed(),
            gone = report.gone(),
            "Notification dispatched"
        );

        Ok(report)
    }

    async fn deliver(
        &self,
        notification_id: Uuid,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryOutcome {
        let result = self
            .sender
            .send(&subscription.endpoint, &subscription.keys(), payload)
            .await;

        if let Err(ref e) = result {
            warn!(
                %notification_id,
                subscription_id = %subscription.id,
                endpoint = %subscription.endpoint,
                expired = e.is_gone(),
                "Push notification failed: {}",
                e
            );
        }

        DeliveryOutcome {
            subscription_id: subscription.id,
            endpoint: subscription.endpoint.clone(),
            result,
        }
    }
}
