use crate::errors::AppError;
use crate::models::document::UploadedDocument;
use crate::models::job::JobTarget;
use crate::models::session::Session;
use crate::models::settings::Settings;

/// Everything one analysis run sends to the matching service.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub resumes: Vec<UploadedDocument>,
    pub job_targets: Vec<JobTarget>,
    pub settings: Settings,
}

impl AnalysisRequest {
    /// Builds the request from session state, failing before any remote call when
    /// either side of the comparison is missing.
    pub fn from_session(session: &Session) -> Result<Self, AppError> {
        if session.resumes.is_empty() {
            return Err(AppError::Validation(
                "Please upload at least one resume".to_string(),
            ));
        }

        let job_targets = session.effective_job_targets();
        if job_targets.is_empty() {
            return Err(AppError::Validation(
                "Please provide a job description".to_string(),
            ));
        }

        Ok(Self {
            resumes: session.resumes.clone(),
            job_targets,
            settings: session.settings,
        })
    }

    pub fn expected_results(&self) -> usize {
        self.resumes.len() * self.job_targets.len()
    }
}
