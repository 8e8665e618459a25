use anyhow::{bail, Context};

use crate::notification::NotificationService;

#[derive(Clone)]
pub struct AppState {
    pub notification_service: NotificationService,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub scheduler_cron: String,
    pub push: PushConfig,
}

/// Push transport credentials. Loaded once at startup and handed to the
/// sender factory; dispatch code never reads the environment.
#[derive(Clone, Debug)]
pub struct PushConfig {
    pub gateway_url: Option<String>,
    pub timeout_secs: u64,
    pub ttl_secs: u32,
    pub concurrency: usize,
    pub vapid_subject: String,
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let config = Self {
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 3000)?,
            scheduler_cron: std::env::var("SCHEDULER_CRON")
                .unwrap_or_else(|_| "0 * * * * *".to_string()),
            push: PushConfig {
                gateway_url: optional_var("PUSH_GATEWAY_URL"),
                timeout_secs: parse_var("PUSH_TIMEOUT_SECS", 10)?,
                ttl_secs: parse_var("PUSH_TTL_SECS", 86_400)?,
                concurrency: parse_var("PUSH_CONCURRENCY", 16)?,
                vapid_subject: std::env::var("WEB_PUSH_VAPID_SUBJECT")
                    .unwrap_or_else(|_| "mailto:admin@example.com".to_string()),
                vapid_public_key: optional_var("WEB_PUSH_VAPID_PUBLIC_KEY"),
                vapid_private_key: optional_var("WEB_PUSH_VAPID_PRIVATE_KEY"),
            },
        };

        config.push.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PushConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            bail!("PUSH_CONCURRENCY must be at least 1");
        }
        if self.gateway_url.is_some()
            && (self.vapid_public_key.is_none() || self.vapid_private_key.is_none())
        {
            bail!(
                "WEB_PUSH_VAPID_PUBLIC_KEY and WEB_PUSH_VAPID_PRIVATE_KEY must be set when PUSH_GATEWAY_URL is configured"
            );
        }
        Ok(())
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{} must be a number", name)),
        Err(_) => Ok(default),
    }
}
