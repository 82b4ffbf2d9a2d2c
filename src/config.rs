//! Runtime configuration read from environment variables.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::localization::DEFAULT_LOCALES_DIR;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Public URL Telegram delivers updates to; long polling when unset
    pub webhook_url: Option<Url>,
    pub webhook_listen_addr: SocketAddr,
    pub health_addr: SocketAddr,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub locales_dir: PathBuf,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = var("TELEGRAM_BOT_TOKEN").ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;
        let database_url = var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let webhook_url = match var("WEBHOOK_URL") {
            Some(raw) => {
                let url = Url::parse(raw.trim()).with_context(|| format!("Invalid WEBHOOK_URL: {raw}"))?;
                if url.scheme() != "https" {
                    return Err(anyhow!("WEBHOOK_URL must use https, got {}", url.scheme()));
                }
                Some(url)
            }
            None => None,
        };

        Ok(Self {
            bot_token,
            database_url,
            database_max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 5)?,
            webhook_url,
            webhook_listen_addr: parse_or(&var, "WEBHOOK_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8443)))?,
            health_addr: parse_or(&var, "HEALTH_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            session_ttl: Duration::from_secs(parse_or(&var, "SESSION_TTL_SECS", 86_400u64)?.max(1)),
            session_sweep_interval: Duration::from_secs(parse_or(&var, "SESSION_SWEEP_SECS", 300u64)?.max(1)),
            locales_dir: var("LOCALES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCALES_DIR)),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key}={raw}: {e}")),
        None => Ok(default),
    }
}
