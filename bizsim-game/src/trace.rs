//! Structured trace of rule evaluation.
//!
//! Gating and synergy checks report what they decided as data so callers and
//! tests can inspect the reasons. Each event is also mirrored to the `log`
//! facade at debug level.

use serde::Serialize;

use crate::data::Effects;
use crate::state::RunStatus;

const LOG_TARGET: &str = "bizsim::rules";

/// Severity tier for a rule event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Availability verdict for one catalog option in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub option_id: String,
    pub available: bool,
    /// Required history keys not yet recorded; empty when available.
    pub missing: Vec<String>,
}

/// Something the engine decided while applying a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleEvent {
    DecisionRecorded {
        key: String,
    },
    UnlockRecorded {
        key: String,
    },
    SynergyApplied {
        activation_id: String,
        source: String,
        bonus: Effects,
    },
    SynergyAlreadyApplied {
        activation_id: String,
    },
    SynergySourceMissing {
        source: String,
        consumer: String,
    },
    /// An effect named an indicator the run does not track.
    IndicatorIgnored {
        indicator: String,
    },
    PhaseAdvanced {
        from: usize,
        to: usize,
    },
    StatusChanged {
        from: RunStatus,
        to: RunStatus,
    },
}

impl RuleEvent {
    #[must_use]
    pub const fn severity(&self) -> EventSeverity {
        match self {
            Self::IndicatorIgnored { .. } => EventSeverity::Warning,
            Self::StatusChanged {
                to: RunStatus::Failed,
                ..
            } => EventSeverity::Critical,
            _ => EventSeverity::Info,
        }
    }
}

impl std::fmt::Display for RuleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DecisionRecorded { key } => write!(f, "decision recorded: {key}"),
            Self::UnlockRecorded { key } => write!(f, "unlock recorded: {key}"),
            Self::SynergyApplied { activation_id, .. } => {
                write!(f, "synergy applied: {activation_id}")
            }
            Self::SynergyAlreadyApplied { activation_id } => {
                write!(f, "synergy already applied: {activation_id}")
            }
            Self::SynergySourceMissing { source, consumer } => {
                write!(f, "synergy for {consumer} inactive: {source} not in history")
            }
            Self::IndicatorIgnored { indicator } => {
                write!(f, "effect on unknown indicator ignored: {indicator}")
            }
            Self::PhaseAdvanced { from, to } => write!(f, "phase advanced: {from} -> {to}"),
            Self::StatusChanged { from, to } => write!(f, "status changed: {from} -> {to}"),
        }
    }
}

/// Append `event` to `events` and mirror it to the log.
pub(crate) fn record(events: &mut Vec<RuleEvent>, event: RuleEvent) {
    match event.severity() {
        EventSeverity::Info => log::debug!(target: LOG_TARGET, "{event}"),
        EventSeverity::Warning | EventSeverity::Critical => {
            log::warn!(target: LOG_TARGET, "{event}");
        }
    }
    events.push(event);
}
