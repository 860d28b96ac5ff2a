use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external matching service.
    pub match_api_url: String,
    pub match_api_timeout: Duration,
    /// Pause between visible analysis stage changes.
    pub stage_delay: Duration,
    /// Sessions untouched for this long are dropped with their uploads.
    pub session_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
    pub keep_alive: KeepAliveConfig,
}

/// Periodic pings that stop free-tier hosts from idling the matching service out.
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub every: Duration,
    pub urls: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let match_api_url = require_env("MATCH_API_URL")?
            .trim_end_matches('/')
            .to_string();

        let keep_alive_urls = std::env::var("KEEP_ALIVE_URLS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        Ok(Config {
            match_api_timeout: Duration::from_secs(parse_env("MATCH_API_TIMEOUT_SECS", 120)?),
            stage_delay: Duration::from_millis(parse_env("STAGE_DELAY_MS", 400)?),
            session_ttl: Duration::from_secs(60 * parse_env::<u64>("SESSION_TTL_MINUTES", 60)?.max(1)),
            port: parse_env("PORT", 3000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            keep_alive: KeepAliveConfig {
                enabled: parse_env("KEEP_ALIVE_ENABLED", false)?,
                every: Duration::from_secs(60 * parse_env::<u64>("KEEP_ALIVE_FREQUENCY_MINUTES", 5)?.max(1)),
                urls: if keep_alive_urls.is_empty() {
                    vec![format!("{match_api_url}/health")]
                } else {
                    keep_alive_urls
                },
            },
            match_api_url,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
