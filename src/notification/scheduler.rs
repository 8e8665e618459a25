use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info, warn};

use super::dispatcher::NotificationDispatcher;
use super::notification_models::NotificationStatus;
use super::notification_repository::NotificationStore;
use crate::error::Result;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The previous tick was still running.
    pub skipped: bool,
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    pub errors: usize,
}

/// Promotes due scheduled notifications into delivery, one tick at a time.
/// Ticks never overlap; due notifications are dispatched sequentially.
#[derive(Clone)]
pub struct NotificationScheduler {
    notifications: Arc<dyn NotificationStore>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    tick_lock: Arc<Mutex<()>>,
}

impl NotificationScheduler {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            dispatcher,
            clock,
            tick_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Fails only if the due query itself fails. Storage errors while
    /// dispatching one notification are logged and counted in `errors`.
    pub async fn tick(&self) -> Result<TickReport> {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            warn!("Previous scheduler tick still running, skipping");
            return Ok(TickReport {
                skipped: true,
                ..TickReport::default()
            });
        };

        let now = self.clock.now();
        let due: Vec<_> = self
            .notifications
            .due_scheduled(now)
            .await?
            .into_iter()
            .filter(|n| n.is_due(now))
            .collect();

        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };
        if due.is_empty() {
            return Ok(report);
        }

        for notification in due {
            info!(
                notification_id = %notification.id,
                user_id = ?notification.user_id,
                scheduled_at = ?notification.scheduled_at,
                "Executing scheduled notification"
            );

            match self.dispatcher.dispatch(&notification).await {
                Ok(dispatch) => match dispatch.status {
                    NotificationStatus::Sent => report.sent += 1,
                    NotificationStatus::Failed => report.failed += 1,
                    NotificationStatus::Pending => {}
                },
                Err(e) => {
                    error!(
                        notification_id = %notification.id,
                        "Scheduled dispatch failed, will retry next tick: {:?}",
                        e
                    );
                    report.errors += 1;
                }
            }
        }

        info!(
            due = report.due,
            sent = report.sent,
            failed = report.failed,
            errors = report.errors,
            "Scheduler tick finished"
        );
        Ok(report)
    }

    /// Waits for an in-flight tick to finish.
    pub async fn wait_idle(&self) {
        let _guard = self.tick_lock.lock().await;
    }
}

/// Running cron job driving a [`NotificationScheduler`].
pub struct ScheduledDispatch {
    scheduler: NotificationScheduler,
    jobs: JobScheduler,
}

impl ScheduledDispatch {
    /// Stops the timer, then waits for a tick it already fired.
    pub async fn shutdown(mut self) -> std::result::Result<(), JobSchedulerError> {
        self.jobs.shutdown().await?;
        self.scheduler.wait_idle().await;
        info!("Notification scheduler stopped");
        Ok(())
    }
}

pub async fn start_notification_scheduler(
    scheduler: NotificationScheduler,
    cron: &str,
) -> std::result::Result<ScheduledDispatch, JobSchedulerError> {
    let jobs = JobScheduler::new().await?;

    let job_scheduler = scheduler.clone();
    let job = Job::new_async(cron, move |_uuid, _l| {
        let scheduler = job_scheduler.clone();

        Box::pin(async move {
            if let Err(e) = scheduler.tick().await {
                error!("Error checking scheduled notifications: {:?}", e);
            }
        })
    })?;

    jobs.add(job).await?;
    jobs.start().await?;

    info!(cron, "Notification scheduler started");
    Ok(ScheduledDispatch { scheduler, jobs })
}
