//! Matching service client, the single point of entry for calls to the external
//! scoring/matching API. No other module talks to that service directly.
//!
//! Analysis answers come either as an NDJSON stream of progress events or as a
//! single JSON batch; both surface to callers as an [`EventStream`].
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::request::AnalysisRequest;
use crate::models::document::UploadedDocument;
use crate::models::job::{JobDescriptionRequest, JobTarget};

pub mod wire;

use wire::{
    batch_events, decode_ndjson, AnalysisEvent, ApiEnvelope, ErrorBody, JobDescriptionData,
    ResultsData,
};

const ANALYZE_PATH: &str = "/api/resumes/analyze";
const JD_FILE_PATH: &str = "/api/job-description/file";
const JD_GENERATE_PATH: &str = "/api/job-description/generate";
const NDJSON: &str = "application/x-ndjson";

pub type EventStream = BoxStream<'static, Result<AnalysisEvent, ClientError>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Event stream ended before completion")]
    StreamEnded,

    #[error("Matching service returned no data")]
    EmptyResponse,
}

impl ClientError {
    /// Single human-readable line for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(_) => {
                "Could not reach the matching service. Please try again.".to_string()
            }
            ClientError::Api { status, message } if message.trim().is_empty() => {
                format!("The matching service returned an error (status {status})")
            }
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Parse(_) => {
                "The matching service returned an unexpected response".to_string()
            }
            ClientError::Rejected(message) => message.clone(),
            ClientError::StreamEnded => {
                "The analysis stopped before finishing. Please try again.".to_string()
            }
            ClientError::EmptyResponse => "The matching service returned no data".to_string(),
        }
    }
}

/// Seam between the analysis driver and the remote service, so tests and
/// alternative backends can stand in for [`MatchClient`].
#[async_trait]
pub trait MatchService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<EventStream, ClientError>;

    async fn extract_job_description(
        &self,
        document: &UploadedDocument,
    ) -> Result<String, ClientError>;

    async fn generate_job_description(
        &self,
        request: &JobDescriptionRequest,
    ) -> Result<String, ClientError>;
}

#[derive(Clone)]
pub struct MatchClient {
    client: Client,
    base_url: String,
}

impl MatchClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MatchService for MatchClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<EventStream, ClientError> {
        let form = analysis_form(request)?;
        info!(
            "Submitting analysis: {} resume(s) x {} job target(s)",
            request.resumes.len(),
            request.job_targets.len()
        );

        let response = self
            .client
            .post(self.url(ANALYZE_PATH))
            .header(ACCEPT, format!("{NDJSON}, application/json"))
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        if is_ndjson(&response) {
            debug!("Matching service answered with an event stream");
            return Ok(decode_ndjson(response.bytes_stream()));
        }

        let envelope: ApiEnvelope<ResultsData> = response.json().await?;
        let events = batch_events(envelope.into_data()?.results);
        debug!("Matching service answered with a batch ({} events)", events.len());
        Ok(stream::iter(events.into_iter().map(Ok)).boxed())
    }

    async fn extract_job_description(
        &self,
        document: &UploadedDocument,
    ) -> Result<String, ClientError> {
        let form = Form::new().part("file", document_part(document)?);
        let response = self
            .client
            .post(self.url(JD_FILE_PATH))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiEnvelope<JobDescriptionData> = ensure_success(response).await?.json().await?;
        Ok(envelope.into_data()?.job_description)
    }

    async fn generate_job_description(
        &self,
        request: &JobDescriptionRequest,
    ) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url(JD_GENERATE_PATH))
            .form(request)
            .send()
            .await?;
        let envelope: ApiEnvelope<JobDescriptionData> = ensure_success(response).await?.json().await?;
        Ok(envelope.into_data()?.job_description)
    }
}

fn document_part(document: &UploadedDocument) -> Result<Part, ClientError> {
    Ok(Part::bytes(document.bytes.to_vec())
        .file_name(document.filename.clone())
        .mime_str(&document.content_type)?)
}

fn analysis_form(request: &AnalysisRequest) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .text("minimum_score", request.settings.minimum_score().to_string())
        .text(
            "max_missing_skills",
            request.settings.max_missing_skills().to_string(),
        );

    for target in &request.job_targets {
        form = match target {
            JobTarget::Text(text) => form.text("job_description", text.clone()),
            JobTarget::Url(url) => form.text("job_description_url", url.clone()),
            JobTarget::File(doc) => form.part("job_description_file", document_part(doc)?),
        };
    }

    for resume in &request.resumes {
        form = form.part("resumes", document_part(resume)?);
    }

    Ok(form)
}

fn is_ndjson(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with(NDJSON))
        .unwrap_or(false)
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(ErrorBody::into_message)
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = MatchClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.url(ANALYZE_PATH),
            "http://localhost:8000/api/resumes/analyze"
        );
    }

    #[test]
    fn test_api_error_without_message_names_status() {
        let err = ClientError::Api {
            status: 503,
            message: " ".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "The matching service returned an error (status 503)"
        );
    }

    #[test]
    fn test_api_error_surfaces_service_message() {
        let err = ClientError::Api {
            status: 400,
            message: "Maximum 10 resumes allowed".to_string(),
        };
        assert_eq!(err.user_message(), "Maximum 10 resumes allowed");
    }
}
