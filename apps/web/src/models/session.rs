use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::document::{DocumentMeta, UploadedDocument};
use crate::models::job::{JobTarget, JobTargetView};
use crate::models::settings::Settings;
use crate::results::view::ResultView;

/// Presentation switch between recruiter-facing and candidate-facing views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Recruiter,
    Candidate,
}

impl Mode {
    pub fn instructions(&self) -> &'static [&'static str] {
        match self {
            Mode::Recruiter => &[
                "Paste, upload or generate the job description",
                "Upload up to 10 resumes (PDF, DOC or DOCX, 10MB each)",
                "Adjust the minimum score and allowed missing skills",
                "Run the analysis and review the ranked candidates",
            ],
            Mode::Candidate => &[
                "Upload your resume (PDF, DOC or DOCX, 10MB max)",
                "Add one or more job descriptions as text, files or links",
                "Run the analysis to see how well you match each role",
                "Review the skills to strengthen for each job",
            ],
        }
    }
}

/// Per-session UI state shared by every view: the mode, job description,
/// uploaded resumes, job targets and settings.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub mode: Mode,
    pub job_description: String,
    pub resumes: Vec<UploadedDocument>,
    pub job_targets: Vec<JobTarget>,
    pub settings: Settings,
    /// Sort and filter state of the results table.
    pub result_view: ResultView,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mode: Mode,
    pub job_description: String,
    pub resumes: Vec<DocumentMeta>,
    pub job_targets: Vec<JobTargetView>,
    pub settings: Settings,
    pub result_view: ResultView,
    pub instructions: Vec<&'static str>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            job_description: String::new(),
            resumes: Vec::new(),
            job_targets: Vec::new(),
            settings: Settings::default(),
            result_view: ResultView::default(),
            created_at: Utc::now(),
        }
    }

    /// Targets an analysis would run against. The pasted job description stands in
    /// when nothing was added explicitly.
    pub fn effective_job_targets(&self) -> Vec<JobTarget> {
        let explicit: Vec<JobTarget> = self
            .job_targets
            .iter()
            .filter(|t| !t.is_blank())
            .cloned()
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }
        if self.job_description.trim().is_empty() {
            Vec::new()
        } else {
            vec![JobTarget::Text(self.job_description.clone())]
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            mode: self.mode,
            job_description: self.job_description.clone(),
            resumes: self.resumes.iter().map(UploadedDocument::meta).collect(),
            job_targets: self.job_targets.iter().map(JobTarget::view).collect(),
            settings: self.settings,
            result_view: self.result_view,
            instructions: self.mode.instructions().to_vec(),
            created_at: self.created_at,
        }
    }
}
