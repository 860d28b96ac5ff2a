use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    Acceptance,
    Rejection,
}

/// A scored comparison between one resume and one job target, as returned by the
/// matching service. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Source identifier. The matching service names this `filename`.
    #[serde(alias = "filename")]
    pub source: String,
    pub score: f64,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub is_best_match: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_type: Option<EmailType>,
    #[serde(default)]
    pub email_error: Option<String>,
}

impl AnalysisResult {
    pub fn new(source: impl Into<String>, score: f64) -> Self {
        Self {
            source: source.into(),
            score,
            missing_skills: Vec::new(),
            remarks: None,
            is_best_match: false,
            email: None,
            email_type: None,
            email_error: None,
        }
    }
}

/// A file the matching service could not analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    #[serde(alias = "filename")]
    pub source: String,
    pub error: String,
}

/// Ordered collection of results keyed by source identifier.
///
/// Invariant: no two entries share a source. Upserting an existing source replaces
/// it in place; every other entry keeps its position of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: Vec<AnalysisResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the source was new.
    pub fn upsert(&mut self, result: AnalysisResult) -> bool {
        match self.entries.iter_mut().find(|r| r.source == result.source) {
            Some(existing) => {
                *existing = result;
                false
            }
            None => {
                self.entries.push(result);
                true
            }
        }
    }

    pub fn replace_all(&mut self, results: impl IntoIterator<Item = AnalysisResult>) {
        self.entries.clear();
        self.extend(results);
    }

    pub fn as_slice(&self) -> &[AnalysisResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<AnalysisResult> for ResultSet {
    fn extend<I: IntoIterator<Item = AnalysisResult>>(&mut self, iter: I) {
        for result in iter {
            self.upsert(result);
        }
    }
}

impl FromIterator<AnalysisResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = AnalysisResult>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut set = ResultSet::new();
        assert!(set.upsert(AnalysisResult::new("a.pdf", 10.0)));
        assert!(set.upsert(AnalysisResult::new("b.pdf", 20.0)));
        assert!(set.upsert(AnalysisResult::new("c.pdf", 30.0)));
        assert!(!set.upsert(AnalysisResult::new("b.pdf", 99.0)));

        let sources: Vec<_> = set.as_slice().iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(set.as_slice()[1].score, 99.0);
    }

    #[test]
    fn test_collect_keeps_last_duplicate_at_first_position() {
        let set: ResultSet = vec![
            AnalysisResult::new("x", 1.0),
            AnalysisResult::new("y", 2.0),
            AnalysisResult::new("x", 3.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].source, "x");
        assert_eq!(set.as_slice()[0].score, 3.0);
    }

    #[test]
    fn test_replace_all_discards_previous_entries() {
        let mut set: ResultSet = vec![AnalysisResult::new("old", 1.0)].into_iter().collect();
        set.replace_all(vec![AnalysisResult::new("new", 2.0)]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].source, "new");
    }

    #[test]
    fn test_wire_result_accepts_filename_alias() {
        let json = r#"{
            "filename": "Jane_Doe.pdf",
            "score": 82.5,
            "missing_skills": ["Kubernetes"],
            "remarks": "Skills: Rust, Go. 6 years experience",
            "email": "Dear Jane...",
            "email_type": "acceptance",
            "is_best_match": true
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.source, "Jane_Doe.pdf");
        assert_eq!(result.email_type, Some(EmailType::Acceptance));
        assert!(result.is_best_match);
        assert!(result.email_error.is_none());
    }

    #[test]
    fn test_wire_result_minimal_fields() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"source": "cv.docx", "score": 40}"#).unwrap();
        assert!(result.missing_skills.is_empty());
        assert!(result.remarks.is_none());
        assert!(!result.is_best_match);
    }
}
