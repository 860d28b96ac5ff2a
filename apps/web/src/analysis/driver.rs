//! Progressive analysis driver: runs one analysis against the matching service and
//! streams each event into the session's [`AnalysisTracker`] as it arrives.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::analysis::progress::{AnalysisTracker, Transition};
use crate::analysis::request::AnalysisRequest;
use crate::errors::AppError;
use crate::match_client::{ClientError, MatchService};
use crate::models::session::Session;

#[derive(Clone)]
pub struct AnalysisDriver {
    service: Arc<dyn MatchService>,
    /// Pause between visible stage changes so each one registers with the user.
    stage_delay: Duration,
}

impl AnalysisDriver {
    pub fn new(service: Arc<dyn MatchService>, stage_delay: Duration) -> Self {
        Self {
            service,
            stage_delay,
        }
    }

    /// Validates the session, starts a new run on `tracker` and drives it in the
    /// background. Returns the run id.
    ///
    /// Validation failures are returned before any state changes or remote call.
    pub fn start(&self, session: &Session, tracker: &AnalysisTracker) -> Result<u64, AppError> {
        let request = AnalysisRequest::from_session(session)?;
        let run_id = tracker.begin();
        info!(
            "Session {}: starting analysis run {run_id} ({} expected result(s))",
            session.id,
            request.expected_results()
        );

        let driver = self.clone();
        let tracker = tracker.clone();
        tokio::spawn(async move {
            driver.run(request, &tracker, run_id).await;
        });

        Ok(run_id)
    }

    /// Drives one run to completion or failure.
    ///
    /// A superseded run keeps draining its response so the request completes, but
    /// none of its events reach the tracker.
    pub async fn run(&self, request: AnalysisRequest, tracker: &AnalysisTracker, run_id: u64) {
        self.pace().await;
        if tracker.update(run_id, |s| s.mark_submitted()).is_none() {
            debug!("Run {run_id} superseded before submission");
        }

        let mut events = match self.service.analyze(&request).await {
            Ok(events) => events,
            Err(e) => {
                fail(tracker, run_id, &e);
                return;
            }
        };

        let mut superseded = false;
        while let Some(next) = events.next().await {
            let event = match next {
                Ok(event) => event,
                Err(e) => {
                    if !superseded {
                        fail(tracker, run_id, &e);
                    }
                    return;
                }
            };

            if superseded {
                continue;
            }

            let applied = tracker.update(run_id, |s| {
                let stage_before = s.stage;
                let transition = s.apply(event);
                (transition, s.stage != stage_before, s.progress)
            });
            match applied {
                None => {
                    warn!("Run {run_id} superseded; ignoring its remaining events");
                    superseded = true;
                }
                Some((Transition::Continue, stage_changed, progress)) => {
                    debug!("Run {run_id}: {progress}%");
                    if stage_changed {
                        self.pace().await;
                    }
                }
                Some((Transition::Finished, _, _)) => {
                    let results = tracker.current().results;
                    if results.is_empty() {
                        warn!("Run {run_id} complete without any result");
                    } else {
                        info!("Run {run_id} complete with {} result(s)", results.len());
                    }
                    return;
                }
                Some((Transition::Failed, _, _)) => {
                    warn!(
                        "Run {run_id} failed: {}",
                        tracker.current().error.unwrap_or_default()
                    );
                    return;
                }
            }
        }

        if !superseded {
            fail(tracker, run_id, &ClientError::StreamEnded);
        }
    }

    async fn pace(&self) {
        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
    }
}

fn fail(tracker: &AnalysisTracker, run_id: u64, e: &ClientError) {
    error!("Run {run_id} aborted: {e}");
    tracker.update(run_id, |s| s.fail(e.user_message()));
}
