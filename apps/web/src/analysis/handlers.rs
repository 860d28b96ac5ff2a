use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::progress::{AnalysisStatus, PipelineStage};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisStarted {
    pub run_id: u64,
    pub stage: PipelineStage,
    pub progress: u8,
    pub status_message: String,
}

/// POST /api/v1/sessions/:id/analysis
///
/// Starts a new run and returns immediately. Any run still in flight for the
/// session stops updating the status from here on.
pub async fn handle_start_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<AnalysisStarted>), AppError> {
    let entry = state.sessions.get(id).await?;
    let run_id = {
        let session = entry.session.read().await;
        state.driver.start(&session, &entry.analysis)?
    };

    let status = entry.analysis.current();
    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisStarted {
            run_id,
            stage: status.stage,
            progress: status.progress,
            status_message: status.status_message,
        }),
    ))
}

/// GET /api/v1/sessions/:id/analysis
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisStatus>, AppError> {
    let entry = state.sessions.get(id).await?;
    Ok(Json(entry.analysis.current()))
}

/// DELETE /api/v1/sessions/:id/analysis/error
///
/// Dismisses the failure banner. A failed pipeline returns to idle; results
/// received before the failure are kept.
pub async fn handle_dismiss_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisStatus>, AppError> {
    let entry = state.sessions.get(id).await?;
    if entry.analysis.dismiss_error() {
        info!("Session {id}: analysis error dismissed");
    }
    Ok(Json(entry.analysis.current()))
}

/// GET /api/v1/sessions/:id/analysis/events
///
/// Server-sent `status` events: the current status first, then one per change.
pub async fn handle_analysis_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let entry = state.sessions.get(id).await?;
    let rx = entry.analysis.subscribe();

    let events = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let status = rx.borrow_and_update().clone();
        let event = match Event::default().event("status").json_data(&status) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to encode analysis status: {e}");
                Event::default().event("error").data(e.to_string())
            }
        };
        Some((Ok(event), (rx, false)))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
