mod analysis;
mod config;
mod errors;
mod keep_alive;
mod match_client;
mod models;
mod results;
mod routes;
mod session;
mod state;
mod upload;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::match_client::MatchClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting match console v{}", env!("CARGO_PKG_VERSION"));

    // Initialize matching service client
    let matcher = MatchClient::new(&config.match_api_url, config.match_api_timeout)?;
    info!("Matching service client initialized ({})", matcher.base_url());

    // Keep the matching service warm on idle-suspending hosts
    let _keep_alive = keep_alive::spawn(&config.keep_alive);

    let state = AppState::new(config.clone(), Arc::new(matcher));

    // Drop abandoned sessions and the documents they hold
    let _eviction = state.sessions.spawn_eviction(config.session_ttl);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the browser shell has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
