//! Wire shapes exchanged with the matching service, and the NDJSON event decoder.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::match_client::{ClientError, EventStream};
use crate::models::result::{AnalysisResult, FileError};

/// `{ success, message, data, error }` envelope wrapping every JSON answer.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Result<T, ClientError> {
        if !self.success {
            return Err(ClientError::Rejected(self.error.unwrap_or(self.message)));
        }
        self.data.ok_or(ClientError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
pub struct JobDescriptionData {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultsData {
    pub results: Vec<BatchEntry>,
}

/// A batch entry is either a scored result or a per-file failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Analyzed(AnalysisResult),
    Failed { filename: String, error: String },
}

/// Error body shapes the service may answer non-2xx requests with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detail { detail: String },
    Envelope { error: String },
    Message { message: String },
}

impl ErrorBody {
    pub fn into_message(self) -> String {
        match self {
            ErrorBody::Detail { detail } => detail,
            ErrorBody::Envelope { error } => error,
            ErrorBody::Message { message } => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStage {
    Queued,
    Analyzing,
    #[serde(alias = "generating-output")]
    GeneratingOutput,
    Complete,
    Failed,
}

/// One incremental status event of an analysis run.
///
/// A `complete` event with `result` set is a partial result for one target.
/// The event with `done = true` is terminal and may carry the full result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEvent {
    pub stage: EventStage,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub results: Option<Vec<AnalysisResult>>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Files that could not be analyzed. The run itself carries on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_errors: Vec<FileError>,
}

impl AnalysisEvent {
    pub fn stage(stage: EventStage) -> Self {
        Self {
            stage,
            progress: None,
            message: None,
            result: None,
            results: None,
            done: false,
            error: None,
            file_errors: Vec::new(),
        }
    }

    pub fn partial(result: AnalysisResult) -> Self {
        Self {
            result: Some(result),
            ..Self::stage(EventStage::Complete)
        }
    }

    pub fn terminal(results: Option<Vec<AnalysisResult>>) -> Self {
        Self {
            results,
            done: true,
            ..Self::stage(EventStage::Complete)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::stage(EventStage::Failed)
        }
    }
}

/// Synthesizes the event sequence for a service that answered with a single batch.
/// Per-file failures ride on the terminal event; a batch in which every file
/// failed becomes a single `failed` event.
pub fn batch_events(entries: Vec<BatchEntry>) -> Vec<AnalysisEvent> {
    let mut results = Vec::with_capacity(entries.len());
    let mut file_errors = Vec::new();
    for entry in entries {
        match entry {
            BatchEntry::Analyzed(result) => results.push(result),
            BatchEntry::Failed { filename, error } => {
                warn!("Matching service could not analyze {filename}: {error}");
                file_errors.push(FileError {
                    source: filename,
                    error,
                });
            }
        }
    }

    if results.is_empty() {
        if let Some(first) = file_errors.first() {
            let mut failed = AnalysisEvent::failed(format!("{}: {}", first.source, first.error));
            failed.file_errors = file_errors;
            return vec![failed];
        }
    }

    let mut events = Vec::with_capacity(results.len() + 2);
    events.push(AnalysisEvent::stage(EventStage::Analyzing));
    events.extend(results.iter().cloned().map(AnalysisEvent::partial));
    let mut terminal = AnalysisEvent::terminal(Some(results));
    terminal.file_errors = file_errors;
    events.push(terminal);
    events
}

struct NdjsonState {
    chunks: BoxStream<'static, Result<Bytes, ClientError>>,
    buffer: Vec<u8>,
    queued: VecDeque<Result<AnalysisEvent, ClientError>>,
    exhausted: bool,
}

impl NdjsonState {
    fn drain_lines(&mut self) {
        while let Some(idx) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=idx).collect();
            self.push_line(&line);
        }
    }

    fn flush_tail(&mut self) {
        let tail = std::mem::take(&mut self.buffer);
        self.push_line(&tail);
    }

    fn push_line(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.queued
            .push_back(serde_json::from_str::<AnalysisEvent>(text).map_err(ClientError::Parse));
    }
}

/// Decodes a newline-delimited JSON byte stream into analysis events.
///
/// Lines may be split across chunks. A transport error ends the stream after
/// being yielded once.
pub fn decode_ndjson<S, E>(chunks: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError>,
{
    let state = NdjsonState {
        chunks: chunks.map(|chunk| chunk.map_err(Into::into)).boxed(),
        buffer: Vec::new(),
        queued: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.queued.pop_front() {
                return Some((item, state));
            }
            if state.exhausted {
                return None;
            }
            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.exhausted = true;
                    state.queued.push_back(Err(e));
                }
                None => {
                    state.exhausted = true;
                    state.flush_tail();
                }
            }
        }
    })
    .boxed()
}
