pub mod subscription_dto;
pub mod subscription_models;
pub mod subscription_repository;

pub use subscription_models::{PushSubscription, SubscriptionKeys};
pub use subscription_repository::{SubscriptionRepository, SubscriptionStore};
