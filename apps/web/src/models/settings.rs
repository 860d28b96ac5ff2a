use serde::{Deserialize, Serialize};

pub const MIN_SCORE_CEILING: u8 = 100;
pub const MAX_MISSING_SKILLS_CEILING: u8 = 10;

const DEFAULT_MINIMUM_SCORE: u8 = 70;
const DEFAULT_MAX_MISSING_SKILLS: u8 = 3;

/// Thresholds deciding which analysis results count as qualifying matches.
///
/// Both fields are clamped on every write, so a `Settings` value is always in range:
/// `minimum_score` in 0..=100 and `max_missing_skills` in 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    minimum_score: u8,
    max_missing_skills: u8,
}

/// Partial update from the settings panel. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub minimum_score: Option<i64>,
    pub max_missing_skills: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(
            i64::from(DEFAULT_MINIMUM_SCORE),
            i64::from(DEFAULT_MAX_MISSING_SKILLS),
        )
    }
}

impl Settings {
    pub fn new(minimum_score: i64, max_missing_skills: i64) -> Self {
        Self {
            minimum_score: clamp_to(minimum_score, MIN_SCORE_CEILING),
            max_missing_skills: clamp_to(max_missing_skills, MAX_MISSING_SKILLS_CEILING),
        }
    }

    pub fn minimum_score(&self) -> u8 {
        self.minimum_score
    }

    pub fn max_missing_skills(&self) -> u8 {
        self.max_missing_skills
    }

    pub fn set_minimum_score(&mut self, value: i64) {
        self.minimum_score = clamp_to(value, MIN_SCORE_CEILING);
    }

    pub fn set_max_missing_skills(&mut self, value: i64) {
        self.max_missing_skills = clamp_to(value, MAX_MISSING_SKILLS_CEILING);
    }

    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(score) = update.minimum_score {
            self.set_minimum_score(score);
        }
        if let Some(missing) = update.max_missing_skills {
            self.set_max_missing_skills(missing);
        }
    }

    /// A result qualifies when it meets the score threshold without exceeding
    /// the missing-skill allowance.
    pub fn qualifies(&self, score: f64, missing_skills: usize) -> bool {
        score >= f64::from(self.minimum_score) && missing_skills <= usize::from(self.max_missing_skills)
    }
}

fn clamp_to(value: i64, ceiling: u8) -> u8 {
    value.clamp(0, i64::from(ceiling)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_70_and_3() {
        let settings = Settings::default();
        assert_eq!(settings.minimum_score(), 70);
        assert_eq!(settings.max_missing_skills(), 3);
    }

    #[test]
    fn test_new_clamps_out_of_range_values() {
        let settings = Settings::new(150, -4);
        assert_eq!(settings.minimum_score(), 100);
        assert_eq!(settings.max_missing_skills(), 0);

        let settings = Settings::new(-1, 42);
        assert_eq!(settings.minimum_score(), 0);
        assert_eq!(settings.max_missing_skills(), 10);
    }

    #[test]
    fn test_every_update_stays_in_range() {
        let mut settings = Settings::default();
        for value in [-1000, -1, 0, 5, 10, 11, 99, 100, 101, i64::MAX, i64::MIN] {
            settings.set_minimum_score(value);
            settings.set_max_missing_skills(value);
            assert!(settings.minimum_score() <= 100);
            assert!(settings.max_missing_skills() <= 10);
        }
    }

    #[test]
    fn test_partial_update_only_touches_given_fields() {
        let mut settings = Settings::default();
        settings.apply(&SettingsUpdate {
            minimum_score: Some(85),
            max_missing_skills: None,
        });
        assert_eq!(settings.minimum_score(), 85);
        assert_eq!(settings.max_missing_skills(), 3);

        settings.apply(&SettingsUpdate {
            minimum_score: None,
            max_missing_skills: Some(25),
        });
        assert_eq!(settings.minimum_score(), 85);
        assert_eq!(settings.max_missing_skills(), 10);
    }

    #[test]
    fn test_qualifies_uses_both_thresholds() {
        let settings = Settings::default();
        assert!(settings.qualifies(70.0, 3));
        assert!(!settings.qualifies(69.9, 0));
        assert!(!settings.qualifies(95.0, 4));
    }

    #[test]
    fn test_settings_serialize_as_plain_fields() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["minimum_score"], 70);
        assert_eq!(json["max_missing_skills"], 3);
    }
}
