use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::progress::AnalysisTracker;
use crate::errors::AppError;
use crate::models::session::{Mode, Session};

/// One browser session: its UI state plus the status of its analysis runs.
#[derive(Debug)]
pub struct SessionEntry {
    pub session: RwLock<Session>,
    pub analysis: AnalysisTracker,
    last_seen: Mutex<Instant>,
}

impl SessionEntry {
    /// Untouched for at least `ttl` and not waiting on an analysis.
    async fn is_idle(&self, ttl: Duration) -> bool {
        !self.analysis.is_pending() && self.last_seen.lock().await.elapsed() >= ttl
    }
}

/// Upper bound on the pause between idle-session sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-memory session registry. Nothing is persisted; sessions last until deleted,
/// evicted for idleness, or the process exits.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Arc<SessionEntry>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, mode: Mode) -> Arc<SessionEntry> {
        let session = Session::new(mode);
        let id = session.id;
        let entry = Arc::new(SessionEntry {
            session: RwLock::new(session),
            analysis: AnalysisTracker::new(),
            last_seen: Mutex::new(Instant::now()),
        });
        self.inner.write().await.insert(id, entry.clone());
        info!("Session {id} created ({mode:?} mode)");
        entry
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Result<Arc<SessionEntry>, AppError> {
        let entry = self
            .inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        *entry.last_seen.lock().await = Instant::now();
        Ok(entry)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.inner.write().await.remove(&id);
        match removed {
            Some(_) => {
                info!("Session {id} removed");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Session {id} not found"))),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Drops sessions idle for at least `ttl`, along with their uploaded bytes.
    /// Returns how many were removed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.inner.write().await;
        let mut expired = Vec::new();
        for (id, entry) in sessions.iter() {
            if entry.is_idle(ttl).await {
                expired.push(*id);
            }
        }
        for id in &expired {
            sessions.remove(id);
            info!("Session {id} evicted after {}s idle", ttl.as_secs());
        }
        expired.len()
    }

    /// Sweeps idle sessions in the background for the life of the process.
    pub fn spawn_eviction(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let every = (ttl / 4).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        info!(
            "Evicting sessions idle for {}s (sweep every {}s)",
            ttl.as_secs(),
            every.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(ttl).await;
                debug!("Idle sweep removed {evicted} session(s)");
            }
        })
    }
}
