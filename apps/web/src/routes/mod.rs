pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::results::handlers as results;
use crate::session::handlers as session;
use crate::state::AppState;
use crate::upload::{MAX_FILE_SIZE, MAX_UPLOADS};

/// Largest accepted request body: a full batch of maximum-size files plus form overhead.
const MAX_BODY_BYTES: usize = MAX_FILE_SIZE * MAX_UPLOADS + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session state
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/mode", put(session::handle_set_mode))
        .route(
            "/api/v1/sessions/:id/settings",
            put(session::handle_update_settings),
        )
        .route(
            "/api/v1/sessions/:id/job-description",
            put(session::handle_set_job_description),
        )
        .route(
            "/api/v1/sessions/:id/job-description/file",
            post(session::handle_upload_job_description),
        )
        .route(
            "/api/v1/sessions/:id/job-description/generate",
            post(session::handle_generate_job_description),
        )
        .route(
            "/api/v1/sessions/:id/job-targets",
            put(session::handle_set_job_targets).delete(session::handle_clear_job_targets),
        )
        .route(
            "/api/v1/sessions/:id/job-targets/files",
            post(session::handle_upload_job_targets),
        )
        .route(
            "/api/v1/sessions/:id/resumes",
            post(session::handle_upload_resumes),
        )
        // Analysis
        .route(
            "/api/v1/sessions/:id/analysis",
            post(analysis::handle_start_analysis).get(analysis::handle_get_analysis),
        )
        .route(
            "/api/v1/sessions/:id/analysis/error",
            delete(analysis::handle_dismiss_error),
        )
        .route(
            "/api/v1/sessions/:id/analysis/events",
            get(analysis::handle_analysis_events),
        )
        // Results
        .route("/api/v1/sessions/:id/results", get(results::handle_get_results))
        .route(
            "/api/v1/sessions/:id/results/sort",
            post(results::handle_toggle_sort),
        )
        .route(
            "/api/v1/sessions/:id/results/view",
            put(results::handle_set_filter),
        )
        .route(
            "/api/v1/sessions/:id/suggestions",
            get(results::handle_get_suggestions),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
