use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use super::{PushError, PushSender, VapidSigner};
use crate::subscription::SubscriptionKeys;

/// Forwards pushes to a Web Push gateway, which encrypts the payload with the
/// subscription keys and relays it to the browser's push service.
pub struct GatewayPushSender {
    client: Client,
    gateway_url: String,
    signer: VapidSigner,
    ttl_secs: u32,
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    endpoint: &'a str,
    keys: &'a SubscriptionKeys,
    /// Raw payload bytes, base64url without padding.
    payload: String,
    ttl: u32,
}

fn encode_payload(payload: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(payload)
}

impl GatewayPushSender {
    pub fn new(
        gateway_url: &str,
        signer: VapidSigner,
        timeout: Duration,
        ttl_secs: u32,
    ) -> Result<Self, PushError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            gateway_url: gateway_url.to_string(),
            signer,
            ttl_secs,
        })
    }
}

#[async_trait]
impl PushSender for GatewayPushSender {
    async fn send(
        &self,
        endpoint: &str,
        keys: &SubscriptionKeys,
        payload: &[u8],
    ) -> Result<(), PushError> {
        let authorization = self.signer.authorization(endpoint)?;

        let response = self
            .client
            .post(&self.gateway_url)
            .header(header::AUTHORIZATION, authorization)
            .header("TTL", self.ttl_secs.to_string())
            .json(&GatewayRequest {
                endpoint,
                keys,
                payload: encode_payload(payload),
                ttl: self.ttl_secs,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, body))
    }
}

fn classify_failure(status: StatusCode, body: String) -> PushError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => PushError::Gone(status.as_u16()),
        _ => PushError::Rejected {
            status: status.as_u16(),
            body,
        },
    }
}
