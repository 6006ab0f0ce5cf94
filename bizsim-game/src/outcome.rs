//! Values handed across the presentation boundary.
use serde::Serialize;

use crate::data::Choice;
use crate::indicators::Indicators;
use crate::state::RunStatus;
use crate::trace::{GateDecision, RuleEvent};

/// The current phase with only the options the player may pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisiblePhase {
    /// 0-based position in the catalog.
    pub index: usize,
    pub id: u32,
    pub title: String,
    pub question: String,
    pub options: Vec<VisibleOption>,
    /// One verdict per catalog option, available or not.
    pub gates: Vec<GateDecision>,
}

impl VisiblePhase {
    /// Verdict for a catalog option id, if it belongs to this phase.
    #[must_use]
    pub fn gate(&self, option_id: &str) -> Option<&GateDecision> {
        self.gates.iter().find(|gate| gate.option_id == option_id)
    }

    #[must_use]
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleOption {
    /// Position in the filtered list; the value `apply_decision` expects.
    pub index: usize,
    pub id: String,
    pub text: String,
    pub description: String,
    pub strategy_type: String,
}

impl VisibleOption {
    pub(crate) fn from_choice(index: usize, choice: &Choice) -> Self {
        Self {
            index,
            id: choice.id.clone(),
            text: choice.text.clone(),
            description: choice.description.clone(),
            strategy_type: choice.strategy_type.clone(),
        }
    }
}

/// How one indicator moved as a result of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectChange {
    pub indicator: String,
    /// Requested change, base plus synergy, before clamping.
    pub delta: i32,
    /// Portion of `delta` contributed by a synergy bonus.
    pub synergy_delta: i32,
    pub old_value: i32,
    pub new_value: i32,
    /// Whether a synergy bonus touched this indicator.
    pub synergy: bool,
}

impl EffectChange {
    /// Change actually applied after clamping.
    #[must_use]
    pub const fn applied(&self) -> i32 {
        self.new_value - self.old_value
    }
}

/// Result of a successful `apply_decision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub decision_text: String,
    pub history_key: String,
    pub effects: Vec<EffectChange>,
    pub critical_indicators: Vec<String>,
    pub failed_indicators: Vec<String>,
    pub status: RunStatus,
    pub game_over: bool,
    pub game_completed: bool,
    pub events: Vec<RuleEvent>,
}

impl DecisionOutcome {
    #[must_use]
    pub fn synergy_applied(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, RuleEvent::SynergyApplied { .. }))
    }

    #[must_use]
    pub fn has_critical_warning(&self) -> bool {
        !self.critical_indicators.is_empty() && !self.game_over
    }
}

/// Where the run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 0-based phase pointer.
    pub phase_index: usize,
    pub total_phases: usize,
    pub status: RunStatus,
}

impl Progress {
    /// 1-based phase number for display, capped at the phase count.
    #[must_use]
    pub fn phase_number(&self) -> usize {
        (self.phase_index + 1).min(self.total_phases)
    }
}

/// Snapshot of indicator values for live display.
pub type IndicatorSnapshot = Indicators;
