// config.rs
// Runtime configuration read from the environment (after `.env` is loaded).

use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub auth_url: String,
    pub auth_key: String,
    pub bind: SocketAddr,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
    pub cookie_secure: bool,
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{name} must be set"))?;
    let value = value.trim().trim_end_matches('/').to_string();
    if value.is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(value)
}

fn seconds(name: &str, default: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{name} must be a number of seconds")),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("VOSTOK_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cookie_secure = env::var("VOSTOK_COOKIE_SECURE")
            .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            api_url: required("VOSTOK_API_URL")?,
            auth_url: required("VOSTOK_AUTH_URL")?,
            auth_key: required("VOSTOK_AUTH_KEY")?,
            bind: bind
                .parse()
                .with_context(|| format!("VOSTOK_BIND is not an address: {bind}"))?,
            cache_ttl: seconds("VOSTOK_CACHE_TTL_SECONDS", 30)?,
            http_timeout: seconds("VOSTOK_HTTP_TIMEOUT_SECONDS", 15)?,
            cookie_secure,
        })
    }

    /// Configuration pointing both backends at one base URL, used by tests
    /// and local fakes.
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            api_url: base.clone(),
            auth_url: base,
            auth_key: "anon-key".to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            cache_ttl: Duration::from_secs(30),
            http_timeout: Duration::from_secs(5),
            cookie_secure: false,
        }
    }
}
