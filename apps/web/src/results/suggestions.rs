use std::collections::HashMap;

use serde::Serialize;

use crate::models::session::Mode;
use crate::results::adapter::CandidateData;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillGap {
    pub skill: String,
    /// How many results list this skill as missing.
    pub occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSuggestions {
    pub id: String,
    pub name: String,
    pub missing_skills: Vec<String>,
    pub email: Option<String>,
    /// Why no email draft is available, when generation failed.
    pub email_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionPanel {
    pub title: &'static str,
    pub common_gaps: Vec<SkillGap>,
    pub per_candidate: Vec<CandidateSuggestions>,
}

pub fn build_suggestions(mode: Mode, candidates: &[CandidateData]) -> SuggestionPanel {
    let title = match mode {
        Mode::Recruiter => "Skill gaps across candidates",
        Mode::Candidate => "Skills to strengthen",
    };

    SuggestionPanel {
        title,
        common_gaps: aggregate_gaps(candidates),
        per_candidate: candidates
            .iter()
            .filter(|c| {
                !c.missing_skills.is_empty() || c.email.is_some() || c.email_error.is_some()
            })
            .map(|c| CandidateSuggestions {
                id: c.id.clone(),
                name: c.name.clone(),
                missing_skills: c.missing_skills.clone(),
                email: c.email.clone(),
                email_error: c.email_error.clone(),
            })
            .collect(),
    }
}

/// Missing skills counted case-insensitively, most frequent first; ties keep the
/// order in which each skill was first seen. The first spelling seen is kept.
pub fn aggregate_gaps(candidates: &[CandidateData]) -> Vec<SkillGap> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut gaps: Vec<SkillGap> = Vec::new();

    for candidate in candidates {
        for skill in &candidate.missing_skills {
            let skill = skill.trim();
            if skill.is_empty() || skill.eq_ignore_ascii_case("none") {
                continue;
            }
            match index.get(&skill.to_lowercase()) {
                Some(&i) => gaps[i].occurrences += 1,
                None => {
                    index.insert(skill.to_lowercase(), gaps.len());
                    gaps.push(SkillGap {
                        skill: skill.to_string(),
                        occurrences: 1,
                    });
                }
            }
        }
    }

    gaps.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    gaps
}
