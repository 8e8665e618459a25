//! Outbound Web Push delivery.
//!
//! The dispatcher only knows the [`PushSender`] capability: hand it an
//! endpoint, the subscription keys and a payload, get back success or a
//! [`PushError`]. Payload encryption happens behind the sender.

pub mod gateway;
pub mod vapid;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::state::PushConfig;
use crate::subscription::SubscriptionKeys;

pub use gateway::GatewayPushSender;
pub use vapid::VapidSigner;

#[derive(Error, Debug)]
pub enum PushError {
    /// The push service no longer knows this endpoint (404/410).
    #[error("Endpoint gone (HTTP {0})")]
    Gone(u16),

    #[error("Push rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("VAPID error: {0}")]
    Vapid(String),
}

impl PushError {
    pub fn is_gone(&self) -> bool {
        matches!(self, PushError::Gone(_))
    }
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        keys: &SubscriptionKeys,
        payload: &[u8],
    ) -> Result<(), PushError>;
}

/// Sender used when no gateway is configured. Every push "succeeds" and is
/// only written to the log.
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        endpoint: &str,
        _keys: &SubscriptionKeys,
        payload: &[u8],
    ) -> Result<(), PushError> {
        tracing::info!(
            endpoint,
            payload_bytes = payload.len(),
            "Push gateway not configured, logging push instead"
        );
        Ok(())
    }
}

/// Builds the process-wide push sender from configuration.
pub fn build_sender(config: &PushConfig) -> anyhow::Result<Arc<dyn PushSender>> {
    let Some(gateway_url) = config.gateway_url.as_deref() else {
        tracing::warn!("PUSH_GATEWAY_URL not set, pushes will only be logged");
        return Ok(Arc::new(LogPushSender));
    };

    let (Some(public_key), Some(private_key)) = (
        config.vapid_public_key.as_deref(),
        config.vapid_private_key.as_deref(),
    ) else {
        anyhow::bail!("VAPID keys are required for the push gateway");
    };

    let signer = VapidSigner::new(&config.vapid_subject, public_key, private_key)?;
    let sender = GatewayPushSender::new(
        gateway_url,
        signer,
        Duration::from_secs(config.timeout_secs),
        config.ttl_secs,
    )?;

    tracing::info!(gateway = gateway_url, "Push gateway configured");
    Ok(Arc::new(sender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let keys = SubscriptionKeys {
            p256dh: "BKey".to_string(),
            auth: "secret".to_string(),
        };

        let result = LogPushSender
            .send("https://push.example.com/abc", &keys, b"{}")
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn test_build_sender_without_gateway() {
        let config = PushConfig {
            gateway_url: None,
            timeout_secs: 5,
            ttl_secs: 60,
            concurrency: 1,
            vapid_subject: "mailto:ops@example.com".to_string(),
            vapid_public_key: None,
            vapid_private_key: None,
        };

        assert!(build_sender(&config).is_ok());
    }

    #[test]
    fn test_gone_classification() {
        assert!(PushError::Gone(410).is_gone());
        assert!(!PushError::Rejected {
            status: 400,
            body: String::new()
        }
        .is_gone());
    }
}
