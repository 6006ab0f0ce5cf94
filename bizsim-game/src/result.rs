//! End of run scoring.
use serde::{Deserialize, Serialize};

use crate::constants::{
    MESSAGE_CRITICAL, MESSAGE_EXCELLENT, MESSAGE_GOOD, MESSAGE_REGULAR, SCORE_EXCELLENT_MIN,
    SCORE_GOOD_MIN, SCORE_REGULAR_MIN,
};
use crate::indicators::Indicators;

/// Lower bounds (inclusive) of each score category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBands {
    #[serde(default = "ScoreBands::default_excellent_min")]
    pub excellent_min: f64,
    #[serde(default = "ScoreBands::default_good_min")]
    pub good_min: f64,
    #[serde(default = "ScoreBands::default_regular_min")]
    pub regular_min: f64,
}

impl ScoreBands {
    const fn default_excellent_min() -> f64 {
        SCORE_EXCELLENT_MIN
    }

    const fn default_good_min() -> f64 {
        SCORE_GOOD_MIN
    }

    const fn default_regular_min() -> f64 {
        SCORE_REGULAR_MIN
    }

    #[must_use]
    pub fn categorize(&self, average: f64) -> ScoreCategory {
        if average >= self.excellent_min {
            ScoreCategory::Excellent
        } else if average >= self.good_min {
            ScoreCategory::Good
        } else if average >= self.regular_min {
            ScoreCategory::Regular
        } else {
            ScoreCategory::Critical
        }
    }
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            excellent_min: SCORE_EXCELLENT_MIN,
            good_min: SCORE_GOOD_MIN,
            regular_min: SCORE_REGULAR_MIN,
        }
    }
}

/// Final score category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    Excellent,
    Good,
    Regular,
    Critical,
}

impl ScoreCategory {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Excellent => MESSAGE_EXCELLENT,
            Self::Good => MESSAGE_GOOD,
            Self::Regular => MESSAGE_REGULAR,
            Self::Critical => MESSAGE_CRITICAL,
        }
    }
}

impl std::fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Regular => write!(f, "regular"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Scored summary of a run for the result screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalResults {
    pub average_score: f64,
    pub category: ScoreCategory,
    pub message: String,
    pub indicators: Indicators,
}

/// Score the given indicator values.
#[must_use]
pub fn final_results(indicators: &Indicators, bands: &ScoreBands) -> FinalResults {
    let average_score = indicators.average();
    let category = bands.categorize(average_score);
    FinalResults {
        average_score,
        category,
        message: category.message().to_string(),
        indicators: indicators.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_inclusive() {
        let bands = ScoreBands::default();
        assert_eq!(bands.categorize(100.0), ScoreCategory::Excellent);
        assert_eq!(bands.categorize(70.0), ScoreCategory::Excellent);
        assert_eq!(bands.categorize(69.9), ScoreCategory::Good);
        assert_eq!(bands.categorize(50.0), ScoreCategory::Good);
        assert_eq!(bands.categorize(49.9), ScoreCategory::Regular);
        assert_eq!(bands.categorize(30.0), ScoreCategory::Regular);
        assert_eq!(bands.categorize(29.9), ScoreCategory::Critical);
        assert_eq!(bands.categorize(0.0), ScoreCategory::Critical);
    }

    #[test]
    fn final_results_carry_fixed_message() {
        let indicators = Indicators::uniform(&["A", "B"], 80);
        let results = final_results(&indicators, &ScoreBands::default());
        assert_eq!(results.category, ScoreCategory::Excellent);
        assert_eq!(results.message, MESSAGE_EXCELLENT);
        assert!((results.average_score - 80.0).abs() < f64::EPSILON);
        assert_eq!(results.indicators, indicators);
    }

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ScoreCategory::Regular).unwrap(),
            r#""regular""#
        );
        assert_eq!(ScoreCategory::Critical.to_string(), "critical");
    }
}
