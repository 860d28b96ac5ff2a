use std::sync::Arc;

use crate::analysis::driver::AnalysisDriver;
use crate::config::Config;
use crate::match_client::MatchService;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Matching service backend. `MatchClient` in production.
    pub matcher: Arc<dyn MatchService>,
    pub driver: AnalysisDriver,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, matcher: Arc<dyn MatchService>) -> Self {
        let driver = AnalysisDriver::new(matcher.clone(), config.stage_delay);
        Self {
            sessions: SessionStore::new(),
            matcher,
            driver,
            config,
        }
    }
}
