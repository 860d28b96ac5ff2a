//! Client-visible analysis status and how incoming events move it forward.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::match_client::wire::{AnalysisEvent, EventStage};
use crate::models::result::{AnalysisResult, FileError, ResultSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Parsing,
    Analyzing,
    Matching,
    Complete,
    Failed,
}

/// What applying one event did to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    Finished,
    Failed,
}

const PARSING_PROGRESS: u8 = 5;
const SUBMITTED_PROGRESS: u8 = 8;
/// Non-terminal events never report more than this; 100 is reserved for completion.
const MAX_PENDING_PROGRESS: u8 = 99;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisStatus {
    pub run_id: u64,
    pub stage: PipelineStage,
    pub progress: u8,
    pub status_message: String,
    pub pending: bool,
    pub finished: bool,
    pub error: Option<String>,
    pub results: ResultSet,
    /// Files the matching service reported as unreadable during this run.
    pub file_errors: Vec<FileError>,
}

impl Default for AnalysisStatus {
    fn default() -> Self {
        Self {
            run_id: 0,
            stage: PipelineStage::Idle,
            progress: 0,
            status_message: String::new(),
            pending: false,
            finished: false,
            error: None,
            results: ResultSet::new(),
            file_errors: Vec::new(),
        }
    }
}

impl AnalysisStatus {
    fn begin(run_id: u64) -> Self {
        Self {
            run_id,
            stage: PipelineStage::Parsing,
            progress: PARSING_PROGRESS,
            status_message: "Parsing documents".to_string(),
            pending: true,
            ..Self::default()
        }
    }

    /// Whether the settings-adjustment affordance should be offered.
    pub fn show_settings_adjustment(&self) -> bool {
        self.finished && !self.pending
    }

    pub fn mark_submitted(&mut self) {
        self.stage = PipelineStage::Analyzing;
        self.bump_progress(SUBMITTED_PROGRESS);
        self.status_message = "Uploading documents for analysis".to_string();
    }

    pub fn apply(&mut self, mut event: AnalysisEvent) -> Transition {
        self.file_errors.append(&mut event.file_errors);

        if event.stage == EventStage::Failed {
            let message = event
                .error
                .or(event.message)
                .unwrap_or_else(|| "Analysis failed".to_string());
            self.fail(message);
            return Transition::Failed;
        }

        if event.done {
            self.finish(event.results, event.message);
            return Transition::Finished;
        }

        let (stage, default_progress, default_message) = match event.stage {
            EventStage::Queued => (PipelineStage::Analyzing, 10, "Queued for analysis".to_string()),
            EventStage::Analyzing => (PipelineStage::Analyzing, 35, "Analyzing documents".to_string()),
            EventStage::GeneratingOutput => (
                PipelineStage::Matching,
                70,
                "Generating match results".to_string(),
            ),
            EventStage::Complete | EventStage::Failed => (
                PipelineStage::Matching,
                90,
                match &event.result {
                    Some(result) => format!("Received result for {}", result.source),
                    None => "Finalizing results".to_string(),
                },
            ),
        };

        self.stage = stage;
        self.bump_progress(
            event
                .progress
                .unwrap_or(default_progress)
                .min(MAX_PENDING_PROGRESS),
        );
        self.status_message = event.message.unwrap_or(default_message);

        if let Some(result) = event.result {
            self.results.upsert(result);
        }

        Transition::Continue
    }

    /// Terminal event: confirm or replace the result set.
    fn finish(
        &mut self,
        results: Option<Vec<AnalysisResult>>,
        message: Option<String>,
    ) {
        if let Some(results) = results {
            self.results.replace_all(results);
        }
        self.stage = PipelineStage::Complete;
        self.progress = 100;
        self.pending = false;
        self.finished = true;
        self.error = None;
        self.status_message = message.unwrap_or_else(|| "Analysis complete".to_string());
    }

    /// Aborts the run. Results received so far are kept.
    pub fn fail(&mut self, message: String) {
        self.stage = PipelineStage::Failed;
        self.progress = 0;
        self.pending = false;
        self.finished = false;
        self.status_message = "Analysis failed".to_string();
        self.error = Some(message);
    }

    /// Clears the failure banner and returns to `Idle`. Results received before
    /// the failure stay. Returns `false` when there was nothing to dismiss.
    pub fn dismiss_error(&mut self) -> bool {
        if self.stage != PipelineStage::Failed && self.error.is_none() {
            return false;
        }
        if self.stage == PipelineStage::Failed {
            self.stage = PipelineStage::Idle;
            self.status_message.clear();
        }
        self.error = None;
        true
    }

    fn bump_progress(&mut self, value: u8) {
        self.progress = self.progress.max(value.min(100));
    }
}

/// Publishes the analysis status of one session to any number of observers.
///
/// Each run gets an id; updates tagged with a superseded run id are dropped
/// without notifying anyone.
#[derive(Debug, Clone)]
pub struct AnalysisTracker {
    tx: Arc<watch::Sender<AnalysisStatus>>,
}

impl Default for AnalysisTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AnalysisStatus::default());
        Self { tx: Arc::new(tx) }
    }

    /// Starts a new run, resetting status and results. Returns the run id.
    pub fn begin(&self) -> u64 {
        let mut run_id = 0;
        self.tx.send_modify(|status| {
            run_id = status.run_id + 1;
            *status = AnalysisStatus::begin(run_id);
        });
        run_id
    }

    /// Applies `f` when `run_id` is still current. `None` means the run was superseded.
    pub fn update<R>(&self, run_id: u64, f: impl FnOnce(&mut AnalysisStatus) -> R) -> Option<R> {
        let mut outcome = None;
        self.tx.send_if_modified(|status| {
            if status.run_id != run_id {
                return false;
            }
            outcome = Some(f(status));
            true
        });
        outcome
    }

    /// Dismisses the failure banner of whichever run is current.
    pub fn dismiss_error(&self) -> bool {
        self.tx.send_if_modified(AnalysisStatus::dismiss_error)
    }

    pub fn current(&self) -> AnalysisStatus {
        self.tx.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.tx.borrow().pending
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.tx.subscribe()
    }
}
