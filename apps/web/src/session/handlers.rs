//! Axum route handlers for session state: mode, settings, job description,
//! job targets and resumes.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobDescriptionRequest, JobTarget};
use crate::models::session::{Mode, SessionSnapshot};
use crate::models::settings::{Settings, SettingsUpdate};
use crate::state::AppState;
use crate::upload::{read_documents, MAX_UPLOADS};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub mode: Option<Mode>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

#[derive(Debug, Deserialize)]
pub struct JobDescriptionText {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct JobDescriptionResponse {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobTargetInput {
    Text { text: String },
    Url { url: String },
}

#[derive(Debug, Deserialize)]
pub struct JobTargetsRequest {
    pub targets: Vec<JobTargetInput>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let mode = request.and_then(|Json(r)| r.mode).unwrap_or_default();
    let entry = state.sessions.create(mode).await;
    let snapshot = entry.session.read().await.snapshot();
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let entry = state.sessions.get(id).await?;
    let snapshot = entry.session.read().await.snapshot();
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/mode
pub async fn handle_set_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.write().await;
    if request.mode == Mode::Candidate && session.resumes.len() > 1 {
        return Err(AppError::Validation(
            "Candidate mode works with a single resume; upload one resume first".to_string(),
        ));
    }
    session.mode = request.mode;
    Ok(Json(session.snapshot()))
}

/// PUT /api/v1/sessions/:id/settings
///
/// Values outside the allowed ranges are clamped, not rejected.
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, AppError> {
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.write().await;
    session.settings.apply(&update);
    Ok(Json(session.settings))
}

/// PUT /api/v1/sessions/:id/job-description
pub async fn handle_set_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JobDescriptionText>,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    let entry = state.sessions.get(id).await?;
    entry.session.write().await.job_description = request.job_description.clone();
    Ok(Json(JobDescriptionResponse {
        job_description: request.job_description,
    }))
}

/// POST /api/v1/sessions/:id/job-description/file
///
/// Extracts the text of an uploaded PDF/DOC/DOCX through the matching service.
pub async fn handle_upload_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    let entry = state.sessions.get(id).await?;
    let mut documents = read_documents(&mut multipart, "file").await?;
    if documents.len() > 1 {
        return Err(AppError::Validation(
            "Upload a single job description file".to_string(),
        ));
    }
    let document = documents.remove(0);

    let job_description = state.matcher.extract_job_description(&document).await?;
    info!(
        "Session {id}: job description extracted from {} ({} chars)",
        document.filename,
        job_description.len()
    );
    entry.session.write().await.job_description = job_description.clone();
    Ok(Json(JobDescriptionResponse { job_description }))
}

/// POST /api/v1/sessions/:id/job-description/generate
pub async fn handle_generate_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JobDescriptionRequest>,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    request.validate()?;
    let entry = state.sessions.get(id).await?;

    let job_description = state.matcher.generate_job_description(&request).await?;
    info!(
        "Session {id}: generated job description for '{}'",
        request.job_title
    );
    entry.session.write().await.job_description = job_description.clone();
    Ok(Json(JobDescriptionResponse { job_description }))
}

/// PUT /api/v1/sessions/:id/job-targets
///
/// Replaces the text and URL targets. File targets are left as they are.
pub async fn handle_set_job_targets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JobTargetsRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.write().await;

    let mut targets: Vec<JobTarget> = session
        .job_targets
        .drain(..)
        .filter(|t| matches!(t, JobTarget::File(_)))
        .collect();
    targets.extend(request.targets.into_iter().map(|t| match t {
        JobTargetInput::Text { text } => JobTarget::Text(text),
        JobTargetInput::Url { url } => JobTarget::Url(url),
    }));
    ensure_target_limit(targets.len())?;

    session.job_targets = targets;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/sessions/:id/job-targets/files
///
/// Replaces the file targets. Text and URL targets are left as they are.
pub async fn handle_upload_job_targets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let entry = state.sessions.get(id).await?;
    let documents = read_documents(&mut multipart, "files").await?;

    let mut session = entry.session.write().await;
    let mut targets: Vec<JobTarget> = session
        .job_targets
        .drain(..)
        .filter(|t| !matches!(t, JobTarget::File(_)))
        .collect();
    targets.extend(documents.into_iter().map(JobTarget::File));
    ensure_target_limit(targets.len())?;

    session.job_targets = targets;
    Ok(Json(session.snapshot()))
}

/// DELETE /api/v1/sessions/:id/job-targets
pub async fn handle_clear_job_targets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let entry = state.sessions.get(id).await?;
    let mut session = entry.session.write().await;
    session.job_targets.clear();
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/sessions/:id/resumes
///
/// Replaces the session's resumes wholesale. Candidate mode takes exactly one.
pub async fn handle_upload_resumes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let entry = state.sessions.get(id).await?;
    let documents = read_documents(&mut multipart, "resumes").await?;

    let mut session = entry.session.write().await;
    if session.mode == Mode::Candidate && documents.len() > 1 {
        return Err(AppError::Validation(
            "Candidate mode accepts a single resume".to_string(),
        ));
    }

    info!("Session {id}: {} resume(s) uploaded", documents.len());
    session.resumes = documents;
    Ok(Json(session.snapshot()))
}

fn ensure_target_limit(count: usize) -> Result<(), AppError> {
    if count > MAX_UPLOADS {
        return Err(AppError::Validation(format!(
            "A maximum of {MAX_UPLOADS} job targets is supported"
        )));
    }
    Ok(())
}
