//! Centralized balance and tuning constants for bizsim game logic.
//!
//! These values are the defaults behind [`crate::EngineConfig`]. Keeping them
//! together means the rules only drift through reviewed code changes, while the
//! catalog JSON carries content and nothing else.

// Indicators ---------------------------------------------------------------
pub const INDICATOR_MIN: i32 = 0;
pub const INDICATOR_MAX: i32 = 100;
pub const INITIAL_INDICATOR_VALUE: i32 = 50;
pub const CRITICAL_THRESHOLD: i32 = 20;
pub const FAILURE_THRESHOLD: i32 = 5;
/// Values below this (and above critical) read as a warning in the front end.
pub const WARNING_THRESHOLD: i32 = 50;

pub const DEFAULT_INDICATORS: [&str; 5] = [
    "Liquidez",
    "Rentabilidad",
    "Reputación",
    "Riesgo acumulado",
    "Sostenibilidad estratégica",
];

// Scoring ------------------------------------------------------------------
pub const SCORE_EXCELLENT_MIN: f64 = 70.0;
pub const SCORE_GOOD_MIN: f64 = 50.0;
pub const SCORE_REGULAR_MIN: f64 = 30.0;

pub const MESSAGE_EXCELLENT: &str =
    "Congratulations! You built a solid and prosperous company.";
pub const MESSAGE_GOOD: &str =
    "Good work. Your company is in a stable position with room to grow.";
pub const MESSAGE_REGULAR: &str =
    "Your company survived, but it needs major improvements to prosper.";
pub const MESSAGE_CRITICAL: &str =
    "Your company is in serious trouble. Time to rethink the strategy.";

// History keys -------------------------------------------------------------
pub(crate) const HISTORY_KEY_PREFIX: &str = "isla";
pub(crate) const SYNERGY_ID_JOINER: &str = "_with_";

// Fallback catalog ---------------------------------------------------------
pub(crate) const FALLBACK_PHASE_ID: u32 = 1;
pub(crate) const FALLBACK_PHASE_TITLE: &str = "Island 1 - Bargaining power";
pub(crate) const FALLBACK_PHASE_QUESTION: &str = "How would you manage your supply chain?";
pub(crate) const FALLBACK_OPTION_ID: &str = "A";
pub(crate) const FALLBACK_OPTION_TEXT: &str = "A) Default option";
pub(crate) const FALLBACK_OPTION_DESCRIPTION: &str = "System default option";
