// Declare submodules
pub mod dispatcher;
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;
pub mod notification_service;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public items
pub use dispatcher::NotificationDispatcher;
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use notification_service::NotificationService;
pub use scheduler::{start_notification_scheduler, NotificationScheduler, SystemClock};
