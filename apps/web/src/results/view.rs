//! Sortable, filterable result view over adapted candidates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::results::adapter::CandidateData;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    #[default]
    Score,
    Experience,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Sort and filter state of the results table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub sort_field: SortField,
    pub direction: SortDirection,
    pub min_score: f64,
}

impl ResultView {
    /// Same field flips the direction; a new field starts descending.
    pub fn toggle(&mut self, field: SortField) {
        if self.sort_field == field {
            self.direction = self.direction.flipped();
        } else {
            self.sort_field = field;
            self.direction = SortDirection::Descending;
        }
    }

    /// Filters by `min_score`, then sorts. Equal keys keep their input order.
    pub fn apply(&self, candidates: &[CandidateData]) -> Vec<CandidateData> {
        let mut rows: Vec<CandidateData> = candidates
            .iter()
            .filter(|c| c.score >= self.min_score)
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = compare(self.sort_field, a, b);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        rows
    }
}

fn compare(field: SortField, a: &CandidateData, b: &CandidateData) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Score => a.score.total_cmp(&b.score),
        // `None` (N/A) orders below any known experience.
        SortField::Experience => a.experience_years.cmp(&b.experience_years),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::AnalysisResult;
    use crate::models::settings::Settings;
    use crate::results::adapter::adapt_results;

    fn candidates(rows: &[(&str, f64, &str)]) -> Vec<CandidateData> {
        let results: Vec<AnalysisResult> = rows
            .iter()
            .map(|(source, score, remarks)| AnalysisResult {
                remarks: Some(remarks.to_string()),
                ..AnalysisResult::new(*source, *score)
            })
            .collect();
        adapt_results(&results, &Settings::default()).candidates
    }

    fn scores(rows: &[CandidateData]) -> Vec<f64> {
        rows.iter().map(|c| c.score).collect()
    }

    #[test]
    fn test_score_descending_then_toggle_to_ascending() {
        let data = candidates(&[("a.pdf", 90.0, ""), ("b.pdf", 40.0, ""), ("c.pdf", 70.0, "")]);
        let mut view = ResultView::default();
        assert_eq!(scores(&view.apply(&data)), vec![90.0, 70.0, 40.0]);

        view.toggle(SortField::Score);
        assert_eq!(view.direction, SortDirection::Ascending);
        assert_eq!(scores(&view.apply(&data)), vec![40.0, 70.0, 90.0]);
    }

    #[test]
    fn test_new_field_resets_to_descending() {
        let mut view = ResultView::default();
        view.toggle(SortField::Score);
        assert_eq!(view.direction, SortDirection::Ascending);

        view.toggle(SortField::Name);
        assert_eq!(view.sort_field, SortField::Name);
        assert_eq!(view.direction, SortDirection::Descending);
    }

    #[test]
    fn test_threshold_filter_preserves_order() {
        let data = candidates(&[("a.pdf", 90.0, ""), ("b.pdf", 40.0, ""), ("c.pdf", 70.0, "")]);
        let view = ResultView {
            min_score: 60.0,
            ..ResultView::default()
        };
        assert_eq!(scores(&view.apply(&data)), vec![90.0, 70.0]);

        let ascending = ResultView {
            direction: SortDirection::Ascending,
            ..view
        };
        assert_eq!(scores(&ascending.apply(&data)), vec![70.0, 90.0]);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let data = candidates(&[("first.pdf", 80.0, ""), ("second.pdf", 80.0, ""), ("third.pdf", 80.0, "")]);
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let view = ResultView {
                direction,
                ..ResultView::default()
            };
            let ids: Vec<String> = view.apply(&data).into_iter().map(|c| c.id).collect();
            assert_eq!(ids, vec!["first.pdf", "second.pdf", "third.pdf"]);
        }
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let data = candidates(&[("bob.pdf", 1.0, ""), ("Alice.pdf", 2.0, ""), ("carol.pdf", 3.0, "")]);
        let view = ResultView {
            sort_field: SortField::Name,
            direction: SortDirection::Ascending,
            min_score: 0.0,
        };
        let names: Vec<String> = view.apply(&data).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alice", "bob", "carol"]);
    }

    #[test]
    fn test_experience_sort_puts_unknown_last_when_descending() {
        let data = candidates(&[
            ("a.pdf", 1.0, "no idea"),
            ("b.pdf", 1.0, "2 years experience"),
            ("c.pdf", 1.0, "7 years experience"),
        ]);
        let view = ResultView {
            sort_field: SortField::Experience,
            ..ResultView::default()
        };
        let ids: Vec<String> = view.apply(&data).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c.pdf", "b.pdf", "a.pdf"]);
    }
}
