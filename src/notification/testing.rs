//! In-memory fakes for exercising the dispatch path without Postgres or a
//! push gateway.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::dispatcher::NotificationDispatcher;
use super::notification_models::{Notification, NotificationFilter, NotificationStatus};
use super::notification_repository::{not_found, NotificationStore};
use super::notification_service::NotificationService;
use super::scheduler::Clock;
use crate::error::{AppError, Result};
use crate::push::{PushError, PushSender};
use crate::subscription::{PushSubscription, SubscriptionKeys, SubscriptionStore};

fn storage_down() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

fn matches(filter: &NotificationFilter, notification: &Notification) -> bool {
    filter.user_id.map_or(true, |id| notification.user_id == Some(id))
        && filter.status.map_or(true, |status| notification.status == status)
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    rows: DashMap<Uuid, Notification>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    failing_status_writes: DashSet<Uuid>,
}

impl InMemoryNotificationStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `mark_status` fail for one record only.
    pub fn fail_status_write_for(&self, id: Uuid) {
        self.failing_status_writes.insert(id);
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_down());
        }
        Ok(())
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(storage_down());
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create(
        &self,
        user_id: Option<Uuid>,
        title: &str,
        description: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Notification> {
        self.check_writes()?;

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: description.to_string(),
            status: NotificationStatus::Pending,
            created_at: Utc::now(),
            scheduled_at,
        };
        self.rows.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Notification> {
        self.check_reads()?;
        self.rows
            .get(&id)
            .map(|row| row.value().clone())
            .ok_or_else(not_found)
    }

    async fn list(&self, filter: &NotificationFilter) -> Result<Vec<Notification>> {
        self.check_reads()?;
        let mut notifications: Vec<Notification> = self
            .rows
            .iter()
            .filter(|row| matches(filter, row.value()))
            .map(|row| row.value().clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_status(&self, id: Uuid, status: NotificationStatus) -> Result<bool> {
        self.check_writes()?;
        if self.failing_status_writes.contains(&id) {
            return Err(storage_down());
        }

        match self.rows.get_mut(&id) {
            Some(mut row) => {
                row.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        self.check_reads()?;
        Ok(self
            .rows
            .iter()
            .filter(|row| row.value().is_due(now))
            .map(|row| row.value().clone())
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.check_writes()?;
        self.rows.remove(&id).map(|_| ()).ok_or_else(not_found)
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: DashMap<Uuid, PushSubscription>,
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn register(
        &self,
        user_id: Option<Uuid>,
        endpoint: &str,
        keys: &SubscriptionKeys,
    ) -> Result<PushSubscription> {
        let subscription = PushSubscription {
            id: Uuid::new_v4(),
            user_id,
            endpoint: endpoint.to_string(),
            p256dh: keys.p256dh.clone(),
            auth: keys.auth.clone(),
            created_at: Utc::now(),
        };
        self.rows.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn find_targets(&self, user_id: Option<Uuid>) -> Result<Vec<PushSubscription>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| user_id.is_none() || row.value().user_id == user_id)
            .map(|row| row.value().clone())
            .collect())
    }
}

/// Records every push; endpoints marked with `fail_endpoint` answer 410.
#[derive(Default)]
pub struct ScriptedPushSender {
    failing: DashSet<String>,
    counts: DashMap<String, usize>,
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedPushSender {
    pub fn fail_endpoint(&self, endpoint: &str) {
        self.failing.insert(endpoint.to_string());
    }

    pub fn sent_to(&self, endpoint: &str) -> usize {
        self.counts.get(endpoint).map(|c| *c).unwrap_or(0)
    }

    pub fn total_sent(&self) -> usize {
        self.counts.iter().map(|c| *c.value()).sum()
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for ScriptedPushSender {
    async fn send(
        &self,
        endpoint: &str,
        _keys: &SubscriptionKeys,
        payload: &[u8],
    ) -> std::result::Result<(), PushError> {
        *self.counts.entry(endpoint.to_string()).or_insert(0) += 1;
        self.payloads.lock().unwrap().push(payload.to_vec());

        if self.failing.contains(endpoint) {
            return Err(PushError::Gone(410));
        }
        Ok(())
    }
}

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct ServiceFixture {
    pub notifications: Arc<InMemoryNotificationStore>,
    pub sender: Arc<ScriptedPushSender>,
    pub service: NotificationService,
}

pub fn service_fixture() -> ServiceFixture {
    let notifications = Arc::new(InMemoryNotificationStore::default());
    let subscriptions = Arc::new(InMemorySubscriptionStore::default());
    let sender = Arc::new(ScriptedPushSender::default());
    let dispatcher = NotificationDispatcher::new(
        notifications.clone(),
        subscriptions.clone(),
        sender.clone(),
        4,
    );
    let service = NotificationService::new(notifications.clone(), subscriptions, dispatcher);

    ServiceFixture {
        notifications,
        sender,
        service,
    }
}
