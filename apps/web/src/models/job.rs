use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::document::{DocumentMeta, UploadedDocument};

/// The job side of an analysis run.
#[derive(Debug, Clone)]
pub enum JobTarget {
    Text(String),
    File(UploadedDocument),
    Url(String),
}

/// Serializable view of a [`JobTarget`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobTargetView {
    Text { preview: String },
    File { document: DocumentMeta },
    Url { url: String },
}

const PREVIEW_CHARS: usize = 120;

impl JobTarget {
    pub fn view(&self) -> JobTargetView {
        match self {
            JobTarget::Text(text) => JobTargetView::Text {
                preview: text.chars().take(PREVIEW_CHARS).collect(),
            },
            JobTarget::File(doc) => JobTargetView::File {
                document: doc.meta(),
            },
            JobTarget::Url(url) => JobTargetView::Url { url: url.clone() },
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            JobTarget::Text(text) | JobTarget::Url(text) => text.trim().is_empty(),
            JobTarget::File(doc) => doc.bytes.is_empty(),
        }
    }
}

/// Inputs for generating a job description through the matching service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptionRequest {
    pub job_title: String,
    pub years_experience: i32,
    /// Comma-separated, as typed into the form.
    pub must_have_skills: String,
    pub company_name: String,
    pub employment_type: String,
    pub industry: String,
    pub location: String,
}

impl JobDescriptionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_title.trim().is_empty()
            || self.must_have_skills.trim().is_empty()
            || self.company_name.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Job title, must-have skills and company name are required".to_string(),
            ));
        }
        if self.years_experience < 0 {
            return Err(AppError::Validation(
                "Years of experience cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobDescriptionRequest {
        JobDescriptionRequest {
            job_title: "Backend Engineer".to_string(),
            years_experience: 4,
            must_have_skills: "Rust, Postgres".to_string(),
            company_name: "Acme".to_string(),
            employment_type: "Full-time".to_string(),
            industry: "Fintech".to_string(),
            location: "Remote".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let mut req = request();
        req.job_title = "   ".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_negative_years_is_rejected() {
        let mut req = request();
        req.years_experience = -1;
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_text_target_preview_is_truncated() {
        let target = JobTarget::Text("x".repeat(500));
        match target.view() {
            JobTargetView::Text { preview } => assert_eq!(preview.len(), PREVIEW_CHARS),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_blank_targets() {
        assert!(JobTarget::Text("  ".to_string()).is_blank());
        assert!(JobTarget::Url(String::new()).is_blank());
        assert!(!JobTarget::Url("https://jobs.example/1".to_string()).is_blank());
    }
}
