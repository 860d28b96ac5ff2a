//! Results adapter: reshapes matching-service results into the records the
//! results table renders, plus aggregate metrics.
//!
//! Skill and experience extraction are best-effort pattern matches over the free-text
//! remarks. A miss degrades to an empty list or the `N/A` label and is never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::result::{AnalysisResult, EmailType, ResultSet};
use crate::models::settings::Settings;

pub const EXPERIENCE_NOT_AVAILABLE: &str = "N/A";

/// Display estimate per candidate for the "processing time" tile. Not a measured
/// duration: the matching service does not report timings.
pub const PROCESSING_SECONDS_PER_CANDIDATE: f64 = 2.5;

/// A `Skills:` segment must open the remarks or a sentence, so phrases such as
/// "Missing skills:" or "lacks key skills:" are not read as skills held.
static SKILLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[.\n])\s*skills:\s*([^.\n]+)").expect("valid regex")
});
static EXPERIENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\+?\s*(years?)\b").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateData {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub skills: Vec<String>,
    pub experience: String,
    pub experience_years: Option<u32>,
    pub missing_skills: Vec<String>,
    pub remarks: Option<String>,
    pub is_best_match: bool,
    pub qualifies: bool,
    pub email: Option<String>,
    pub email_type: Option<EmailType>,
    pub email_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultMetrics {
    pub count: usize,
    pub average_score: u32,
    pub processing_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedResults {
    pub candidates: Vec<CandidateData>,
    pub metrics: ResultMetrics,
}

/// Adapts raw results. Duplicate sources collapse to their last occurrence, kept at
/// the position where the source first appeared.
pub fn adapt_results(results: &[AnalysisResult], settings: &Settings) -> AdaptedResults {
    let deduped: ResultSet = results.iter().cloned().collect();
    let candidates: Vec<CandidateData> = deduped
        .as_slice()
        .iter()
        .map(|r| to_candidate(r, settings))
        .collect();
    let metrics = compute_metrics(&candidates);
    AdaptedResults {
        candidates,
        metrics,
    }
}

fn to_candidate(result: &AnalysisResult, settings: &Settings) -> CandidateData {
    let remarks = result.remarks.as_deref().unwrap_or_default();
    let (experience, experience_years) = match extract_experience(remarks) {
        Some((years, label)) => (label, Some(years)),
        None => (EXPERIENCE_NOT_AVAILABLE.to_string(), None),
    };

    CandidateData {
        id: result.source.clone(),
        name: display_name(&result.source),
        score: result.score,
        skills: extract_skills(remarks),
        experience,
        experience_years,
        missing_skills: result.missing_skills.clone(),
        remarks: result.remarks.clone(),
        is_best_match: result.is_best_match,
        qualifies: settings.qualifies(result.score, result.missing_skills.len()),
        email: result.email.clone(),
        email_type: result.email_type,
        email_error: result.email_error.clone(),
    }
}

pub fn compute_metrics(candidates: &[CandidateData]) -> ResultMetrics {
    let count = candidates.len();
    let average_score = if count == 0 {
        0
    } else {
        let total: f64 = candidates.iter().map(|c| c.score).sum();
        (total / count as f64).round().max(0.0) as u32
    };
    ResultMetrics {
        count,
        average_score,
        processing_time_secs: count as f64 * PROCESSING_SECONDS_PER_CANDIDATE,
    }
}

/// `"Jane_Doe_CV.pdf"` → `"Jane Doe CV"`.
pub fn display_name(source: &str) -> String {
    let stem = match source.rfind('.') {
        Some(idx) if idx > 0 => &source[..idx],
        _ => source,
    };
    stem.replace('_', " ").trim().to_string()
}

pub fn extract_skills(remarks: &str) -> Vec<String> {
    SKILLS_RE
        .captures(remarks)
        .and_then(|caps| caps.get(1))
        .map(|list| {
            list.as_str()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the year count and its label, e.g. `(3, "3 years")`.
pub fn extract_experience(remarks: &str) -> Option<(u32, String)> {
    let caps = EXPERIENCE_RE.captures(remarks)?;
    let years: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    Some((years, format!("{years} {unit}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(source: &str, score: f64, remarks: Option<&str>) -> AnalysisResult {
        AnalysisResult {
            remarks: remarks.map(str::to_string),
            ..AnalysisResult::new(source, score)
        }
    }

    #[test]
    fn test_skills_and_experience_from_remarks() {
        let remarks = "Skills: Python, SQL. 3 years experience";
        assert_eq!(extract_skills(remarks), vec!["Python", "SQL"]);
        assert_eq!(extract_experience(remarks), Some((3, "3 years".to_string())));
    }

    #[test]
    fn test_remarks_without_patterns_degrade_quietly() {
        let adapted = adapt_results(
            &[result("a.pdf", 50.0, Some("Strong communicator, eager to learn"))],
            &Settings::default(),
        );
        let candidate = &adapted.candidates[0];
        assert!(candidate.skills.is_empty());
        assert_eq!(candidate.experience, "N/A");
        assert_eq!(candidate.experience_years, None);
    }

    #[test]
    fn test_missing_remarks_degrade_quietly() {
        let adapted = adapt_results(&[result("a.pdf", 50.0, None)], &Settings::default());
        assert!(adapted.candidates[0].skills.is_empty());
        assert_eq!(adapted.candidates[0].experience, EXPERIENCE_NOT_AVAILABLE);
    }

    #[test]
    fn test_singular_year_and_plus_suffix() {
        assert_eq!(
            extract_experience("about 1 year in industry"),
            Some((1, "1 year".to_string()))
        );
        assert_eq!(
            extract_experience("Brings 10+ Years of backend work"),
            Some((10, "10 years".to_string()))
        );
    }

    #[test]
    fn test_skills_list_stops_at_newline_and_drops_empties() {
        let remarks = "Overall good fit.\nskills: Rust, , Tokio ,Axum\nNeeds Kafka";
        assert_eq!(extract_skills(remarks), vec!["Rust", "Tokio", "Axum"]);
    }

    #[test]
    fn test_missing_skills_phrases_are_not_skills_held() {
        assert_eq!(
            extract_skills("Missing skills: Go. Skills: Python, SQL."),
            vec!["Python", "SQL"]
        );
        assert!(extract_skills(
            "Solid backend profile but lacks key skills: Docker, Kubernetes. 4 years experience"
        )
        .is_empty());
    }

    #[test]
    fn test_email_error_is_carried_to_candidate() {
        let failed = AnalysisResult {
            email_error: Some("Email generation timed out".to_string()),
            ..AnalysisResult::new("a.pdf", 75.0)
        };
        let adapted = adapt_results(&[failed], &Settings::default());
        assert_eq!(
            adapted.candidates[0].email_error.as_deref(),
            Some("Email generation timed out")
        );
    }

    #[test]
    fn test_unusual_text_does_not_panic() {
        for remarks in ["", "Skills:", "Skills: .", "99999999999999999999 years", "years 5", "🙂 Skills: Go🙂."] {
            let _ = extract_skills(remarks);
            let _ = extract_experience(remarks);
        }
        assert!(extract_experience("99999999999999999999 years").is_none());
    }

    #[test]
    fn test_display_name_strips_extension_and_underscores() {
        assert_eq!(display_name("Jane_Doe_CV.pdf"), "Jane Doe CV");
        assert_eq!(display_name("john.smith.resume.docx"), "john.smith.resume");
        assert_eq!(display_name("no_extension"), "no extension");
        assert_eq!(display_name(".hidden"), ".hidden");
    }

    #[test]
    fn test_zero_results_have_zero_metrics() {
        let adapted = adapt_results(&[], &Settings::default());
        assert!(adapted.candidates.is_empty());
        assert_eq!(adapted.metrics.count, 0);
        assert_eq!(adapted.metrics.average_score, 0);
        assert_eq!(adapted.metrics.processing_time_secs, 0.0);
    }

    #[test]
    fn test_metrics_round_average_and_scale_time() {
        let adapted = adapt_results(
            &[
                result("a.pdf", 90.0, None),
                result("b.pdf", 40.0, None),
                result("c.pdf", 71.0, None),
            ],
            &Settings::default(),
        );
        assert_eq!(adapted.metrics.count, 3);
        assert_eq!(adapted.metrics.average_score, 67);
        assert_eq!(adapted.metrics.processing_time_secs, 7.5);
    }

    #[test]
    fn test_duplicates_collapse_to_last_upsert() {
        let adapted = adapt_results(
            &[
                result("a.pdf", 10.0, None),
                result("b.pdf", 20.0, None),
                result("a.pdf", 95.0, None),
            ],
            &Settings::default(),
        );
        assert_eq!(adapted.candidates.len(), 2);
        assert_eq!(adapted.candidates[0].id, "a.pdf");
        assert_eq!(adapted.candidates[0].score, 95.0);
        assert_eq!(adapted.candidates[1].id, "b.pdf");
    }

    #[test]
    fn test_qualifies_follows_settings() {
        let mut strong = result("a.pdf", 88.0, None);
        strong.missing_skills = vec!["Go".to_string()];
        let mut gappy = result("b.pdf", 88.0, None);
        gappy.missing_skills = vec!["Go", "K8s", "Kafka", "gRPC"].into_iter().map(String::from).collect();

        let adapted = adapt_results(&[strong, gappy], &Settings::default());
        assert!(adapted.candidates[0].qualifies);
        assert!(!adapted.candidates[1].qualifies);
    }
}
