use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::PushError;

/// VAPID token lifetime. Push services reject anything beyond 24 hours.
const TOKEN_TTL_HOURS: i64 = 12;

#[derive(Debug, Serialize, Deserialize)]
pub struct VapidClaims {
    pub aud: String, // origin of the push endpoint
    pub exp: i64,
    pub sub: String,
}

/// Signs VAPID (RFC 8292) authorization tokens with the server's P-256 key.
pub struct VapidSigner {
    subject: String,
    public_key: String,
    key: EncodingKey,
}

impl VapidSigner {
    /// `private_key_pem` is a PKCS#8 PEM encoded EC P-256 private key.
    pub fn new(subject: &str, public_key: &str, private_key_pem: &str) -> Result<Self, PushError> {
        let key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())
            .map_err(|e| PushError::Vapid(format!("invalid private key: {}", e)))?;

        Ok(Self {
            subject: subject.to_string(),
            public_key: public_key.to_string(),
            key,
        })
    }

    /// Value for the `Authorization` header of a push to `endpoint`.
    pub fn authorization(&self, endpoint: &str) -> Result<String, PushError> {
        let token = self.sign(endpoint)?;
        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }

    pub fn sign(&self, endpoint: &str) -> Result<String, PushError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
            .ok_or_else(|| PushError::Vapid("token expiry out of range".to_string()))?
            .timestamp();

        let claims = VapidClaims {
            aud: audience(endpoint)?,
            exp: expiration,
            sub: self.subject.clone(),
        };

        encode(&Header::new(Algorithm::ES256), &claims, &self.key)
            .map_err(|e| PushError::Vapid(format!("failed to sign token: {}", e)))
    }
}

fn audience(endpoint: &str) -> Result<String, PushError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| PushError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    match url.scheme() {
        "https" | "http" => Ok(url.origin().ascii_serialization()),
        scheme => Err(PushError::InvalidEndpoint(format!(
            "unsupported scheme {}",
            scheme
        ))),
    }
}
