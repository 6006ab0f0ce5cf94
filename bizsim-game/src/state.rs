//! Mutable per-run state.
use serde::Serialize;
use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::constants::{HISTORY_KEY_PREFIX, SYNERGY_ID_JOINER};
use crate::indicators::Indicators;

/// Key recording that `option_id` was chosen in the phase with `phase_id`,
/// e.g. `isla_1_A`.
#[must_use]
pub fn history_key(phase_id: u32, option_id: &str) -> String {
    format!("{HISTORY_KEY_PREFIX}_{phase_id}_{option_id}")
}

/// Identifier that makes a synergy fire at most once per
/// (source choice, consuming choice) pair.
#[must_use]
pub fn synergy_activation_id(source_key: &str, consumer_key: &str) -> String {
    format!("{source_key}{SYNERGY_ID_JOINER}{consumer_key}")
}

/// Lifecycle of a run. Only moves forward out of `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    /// An indicator fell below the failure threshold.
    Failed,
    /// The last phase was resolved without a failure.
    Completed,
}

impl RunStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Failed => write!(f, "failed"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Everything a run mutates. Owned by exactly one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub(crate) indicators: Indicators,
    /// 0-based index into the catalog.
    pub(crate) phase_index: usize,
    pub(crate) status: RunStatus,
    pub(crate) history: HashSet<String>,
    /// Recorded from `unlocks`; nothing consults it when gating.
    pub(crate) unlocked: HashSet<String>,
    pub(crate) applied_synergies: HashSet<String>,
}

impl RunState {
    #[must_use]
    pub fn initial(config: &EngineConfig) -> Self {
        Self {
            indicators: Indicators::uniform(&config.indicators, config.initial_value),
            phase_index: 0,
            status: RunStatus::Active,
            history: HashSet::new(),
            unlocked: HashSet::new(),
            applied_synergies: HashSet::new(),
        }
    }

    #[must_use]
    pub const fn indicators(&self) -> &Indicators {
        &self.indicators
    }

    #[must_use]
    pub const fn phase_index(&self) -> usize {
        self.phase_index
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    #[must_use]
    pub const fn history(&self) -> &HashSet<String> {
        &self.history
    }

    #[must_use]
    pub const fn unlocked(&self) -> &HashSet<String> {
        &self.unlocked
    }

    #[must_use]
    pub const fn applied_synergies(&self) -> &HashSet<String> {
        &self.applied_synergies
    }
}
