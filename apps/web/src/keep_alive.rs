//! Periodic pings that keep idle-suspending hosts (free hosting tiers) awake.

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::KeepAliveConfig;

const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Starts the ping loop in the background. Returns `None` when disabled.
pub fn spawn(config: &KeepAliveConfig) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!("Keep-alive disabled");
        return None;
    }

    let client = match Client::builder().timeout(PING_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Keep-alive not started: {e}");
            return None;
        }
    };

    let every = config.every;
    let urls = config.urls.clone();
    info!(
        "Keep-alive pinging {} URL(s) every {}s",
        urls.len(),
        every.as_secs()
    );

    Some(tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle: u64 = 0;
        loop {
            ticker.tick().await;
            cycle += 1;
            let mut ok = 0;
            for url in &urls {
                if ping(&client, url).await {
                    ok += 1;
                }
            }
            info!("Keep-alive cycle {cycle}: {ok}/{} ping(s) succeeded", urls.len());
        }
    }))
}

/// GETs `url` once. Any non-200 answer or transport failure counts as a miss.
pub async fn ping(client: &Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => true,
        Ok(response) => {
            warn!("Keep-alive ping to {url} returned {}", response.status());
            false
        }
        Err(e) if e.is_timeout() => {
            warn!("Keep-alive ping to {url} timed out after {}s", PING_TIMEOUT.as_secs());
            false
        }
        Err(e) => {
            warn!("Keep-alive ping to {url} failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Router};

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_ping_succeeds_on_200() {
        let base = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
        assert!(ping(&Client::new(), &format!("{base}/health")).await);
    }

    #[tokio::test]
    async fn test_ping_fails_on_error_status() {
        let base = serve(Router::new().route(
            "/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        assert!(!ping(&Client::new(), &format!("{base}/health")).await);
    }

    #[tokio::test]
    async fn test_disabled_config_spawns_nothing() {
        let config = KeepAliveConfig {
            enabled: false,
            every: Duration::from_secs(60),
            urls: vec!["http://localhost/health".to_string()],
        };
        assert!(spawn(&config).is_none());
    }
}
