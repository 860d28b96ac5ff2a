use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::progress::PipelineStage;
use crate::errors::AppError;
use crate::models::result::FileError;
use crate::results::adapter::{adapt_results, CandidateData, ResultMetrics};
use crate::results::suggestions::{build_suggestions, SuggestionPanel};
use crate::results::view::{ResultView, SortDirection, SortField};
use crate::state::AppState;

/// Optional overrides for this response only. The stored view changes through the
/// sort and view routes.
#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
    pub min_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub field: SortField,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub min_score: f64,
}

#[derive(Debug, Serialize)]
pub struct ResultsTable {
    pub rows: Vec<CandidateData>,
    /// Computed over every result, not only the visible rows.
    pub metrics: ResultMetrics,
    pub view: ResultView,
    pub stage: PipelineStage,
    pub progress: u8,
    pub status_message: String,
    pub pending: bool,
    pub error: Option<String>,
    pub file_errors: Vec<FileError>,
    pub show_settings_adjustment: bool,
}

/// GET /api/v1/sessions/:id/results
pub async fn handle_get_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsTable>, AppError> {
    let entry = state.sessions.get(id).await?;
    let (settings, mut view) = {
        let session = entry.session.read().await;
        (session.settings, session.result_view)
    };
    if let Some(field) = query.sort {
        view.sort_field = field;
    }
    if let Some(direction) = query.direction {
        view.direction = direction;
    }
    if let Some(min_score) = query.min_score {
        view.min_score = clamp_score(min_score)?;
    }

    let status = entry.analysis.current();
    let adapted = adapt_results(status.results.as_slice(), &settings);

    Ok(Json(ResultsTable {
        rows: view.apply(&adapted.candidates),
        metrics: adapted.metrics,
        view,
        show_settings_adjustment: status.show_settings_adjustment(),
        stage: status.stage,
        progress: status.progress,
        status_message: status.status_message,
        pending: status.pending,
        error: status.error,
        file_errors: status.file_errors,
    }))
}

/// POST /api/v1/sessions/:id/results/sort
///
/// Same field flips the direction; another field starts descending.
pub async fn handle_toggle_sort(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SortRequest>,
) -> Result<Json<ResultView>, AppError> {
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.write().await;
    session.result_view.toggle(request.field);
    Ok(Json(session.result_view))
}

/// PUT /api/v1/sessions/:id/results/view
pub async fn handle_set_filter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<ResultView>, AppError> {
    let min_score = clamp_score(request.min_score)?;
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.write().await;
    session.result_view.min_score = min_score;
    Ok(Json(session.result_view))
}

/// GET /api/v1/sessions/:id/suggestions
pub async fn handle_get_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuggestionPanel>, AppError> {
    let entry = state.sessions.get(id).await?;
    let (mode, settings) = {
        let session = entry.session.read().await;
        (session.mode, session.settings)
    };

    let status = entry.analysis.current();
    let adapted = adapt_results(status.results.as_slice(), &settings);
    Ok(Json(build_suggestions(mode, &adapted.candidates)))
}

fn clamp_score(value: f64) -> Result<f64, AppError> {
    if !value.is_finite() {
        return Err(AppError::Validation(
            "Minimum score must be a number".to_string(),
        ));
    }
    Ok(value.clamp(0.0, 100.0))
}
