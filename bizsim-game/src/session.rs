//! The decision engine: one run driven through the catalog.
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::data::{Catalog, Choice, Effects, Phase};
use crate::indicators::{IndicatorLevel, Indicators};
use crate::outcome::{DecisionOutcome, EffectChange, Progress, VisibleOption, VisiblePhase};
use crate::result::{FinalResults, final_results};
use crate::state::{RunState, RunStatus, history_key, synergy_activation_id};
use crate::trace::{self, GateDecision, RuleEvent};

/// Rejections from [`DecisionSession::apply_decision`]. No state changes when
/// one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("run is not active (status: {status})")]
    InvalidState { status: RunStatus },
    #[error("option {index} is not available ({available} visible options)")]
    InvalidChoice { index: usize, available: usize },
}

/// A single run over a shared catalog.
#[derive(Debug, Clone)]
pub struct DecisionSession {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    state: RunState,
}

impl DecisionSession {
    /// Start a run with the default configuration.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::from_validated(catalog, EngineConfig::default())
    }

    /// Start a run with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration breaks an invariant.
    pub fn with_config(catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(catalog, config))
    }

    /// Caller guarantees `config` already passed [`EngineConfig::validate`].
    pub(crate) fn from_validated(catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        let state = RunState::initial(&config);
        Self {
            catalog,
            config,
            state,
        }
    }

    /// Back to the initial snapshot.
    pub fn reset(&mut self) {
        self.state = RunState::initial(&self.config);
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.state.status
    }

    #[must_use]
    pub fn indicators(&self) -> Indicators {
        self.state.indicators.clone()
    }

    /// Severity per indicator, in display order.
    #[must_use]
    pub fn indicator_levels(&self) -> Vec<(String, IndicatorLevel)> {
        self.state
            .indicators
            .iter()
            .map(|indicator| {
                (
                    indicator.name.clone(),
                    IndicatorLevel::classify(indicator.value, &self.config),
                )
            })
            .collect()
    }

    #[must_use]
    pub const fn history(&self) -> &HashSet<String> {
        &self.state.history
    }

    #[must_use]
    pub const fn unlocked(&self) -> &HashSet<String> {
        &self.state.unlocked
    }

    #[must_use]
    pub const fn applied_synergies(&self) -> &HashSet<String> {
        &self.state.applied_synergies
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            phase_index: self.state.phase_index,
            total_phases: self.catalog.len(),
            status: self.state.status,
        }
    }

    /// The current phase filtered down to available options, or `None` once
    /// the pointer is past the last phase.
    #[must_use]
    pub fn visible_phase(&self) -> Option<VisiblePhase> {
        let index = self.state.phase_index;
        let phase = self.catalog.phase(index)?;
        let gates: Vec<GateDecision> = phase
            .decisions
            .iter()
            .map(|choice| self.gate(choice))
            .collect();
        let options = phase
            .decisions
            .iter()
            .zip(&gates)
            .filter(|(_, gate)| gate.available)
            .enumerate()
            .map(|(visible_index, (choice, _))| VisibleOption::from_choice(visible_index, choice))
            .collect();
        Some(VisiblePhase {
            index,
            id: phase.id,
            title: phase.title.clone(),
            question: phase.question.clone(),
            options,
            gates,
        })
    }

    fn gate(&self, choice: &Choice) -> GateDecision {
        let missing = choice.requires.missing_from(&self.state.history);
        GateDecision {
            option_id: choice.id.clone(),
            available: missing.is_empty(),
            missing,
        }
    }

    fn available_choices<'a>(&self, phase: &'a Phase) -> Vec<&'a Choice> {
        phase
            .decisions
            .iter()
            .filter(|choice| choice.requires.missing_from(&self.state.history).is_empty())
            .collect()
    }

    /// Resolve the player's pick from the visible option list.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::InvalidState`] once the run has ended and
    /// [`DecisionError::InvalidChoice`] for an index outside the visible list.
    pub fn apply_decision(&mut self, option_index: usize) -> Result<DecisionOutcome, DecisionError> {
        if self.state.status != RunStatus::Active {
            return Err(DecisionError::InvalidState {
                status: self.state.status,
            });
        }
        let catalog = Arc::clone(&self.catalog);
        let phase_index = self.state.phase_index;
        let Some(phase) = catalog.phase(phase_index) else {
            return Err(DecisionError::InvalidChoice {
                index: option_index,
                available: 0,
            });
        };
        let visible = self.available_choices(phase);
        let Some(choice) = visible.get(option_index).copied() else {
            return Err(DecisionError::InvalidChoice {
                index: option_index,
                available: visible.len(),
            });
        };

        let mut events = Vec::new();
        let before = self.state.indicators.clone();
        self.apply_effects(&choice.effects, &mut events);

        let key = history_key(phase.id, &choice.id);
        self.state.history.insert(key.clone());
        trace::record(&mut events, RuleEvent::DecisionRecorded { key: key.clone() });

        if let Some(unlock) = &choice.unlocks {
            self.state.unlocked.insert(unlock.clone());
            trace::record(&mut events, RuleEvent::UnlockRecorded {
                key: unlock.clone(),
            });
        }

        let synergy = self.activate_synergy(choice, &key, &mut events);
        if let Some(bonus) = synergy {
            self.apply_effects(bonus, &mut events);
        }

        let effects = effect_breakdown(&before, &self.state.indicators, &choice.effects, synergy);
        let critical_indicators = self.state.indicators.below(self.config.critical_threshold);
        let failed_indicators = self.state.indicators.below(self.config.failure_threshold);

        let mut game_over = false;
        let mut game_completed = false;
        if !failed_indicators.is_empty() {
            self.transition(RunStatus::Failed, &mut events);
            game_over = true;
        } else if phase_index + 1 >= catalog.len() {
            self.transition(RunStatus::Completed, &mut events);
            game_completed = true;
        } else {
            self.state.phase_index = phase_index + 1;
            trace::record(&mut events, RuleEvent::PhaseAdvanced {
                from: phase_index,
                to: self.state.phase_index,
            });
        }

        Ok(DecisionOutcome {
            decision_text: choice.text.clone(),
            history_key: key,
            effects,
            critical_indicators,
            failed_indicators,
            status: self.state.status,
            game_over,
            game_completed,
            events,
        })
    }

    /// Average score and category for the current indicator values.
    #[must_use]
    pub fn final_results(&self) -> FinalResults {
        final_results(&self.state.indicators, &self.config.score)
    }

    fn apply_effects(&mut self, effects: &Effects, events: &mut Vec<RuleEvent>) {
        for (indicator, delta) in effects.iter() {
            if self.state.indicators.apply_delta(indicator, delta).is_none() {
                trace::record(events, RuleEvent::IndicatorIgnored {
                    indicator: indicator.to_string(),
                });
            }
        }
    }

    /// Record and return the synergy bonus if this pick activates one.
    fn activate_synergy<'c>(
        &mut self,
        choice: &'c Choice,
        consumer_key: &str,
        events: &mut Vec<RuleEvent>,
    ) -> Option<&'c Effects> {
        let (source, bonus) = choice.synergy()?;
        if !self.state.history.contains(source) {
            trace::record(events, RuleEvent::SynergySourceMissing {
                source: source.to_string(),
                consumer: consumer_key.to_string(),
            });
            return None;
        }
        let activation_id = synergy_activation_id(source, consumer_key);
        if !self.state.applied_synergies.insert(activation_id.clone()) {
            trace::record(events, RuleEvent::SynergyAlreadyApplied { activation_id });
            return None;
        }
        trace::record(events, RuleEvent::SynergyApplied {
            activation_id,
            source: source.to_string(),
            bonus: bonus.clone(),
        });
        Some(bonus)
    }

    fn transition(&mut self, to: RunStatus, events: &mut Vec<RuleEvent>) {
        let from = self.state.status;
        self.state.status = to;
        trace::record(events, RuleEvent::StatusChanged { from, to });
    }
}

/// Per-indicator changes in display order, covering every indicator named by
/// the base effects or the synergy bonus.
fn effect_breakdown(
    before: &Indicators,
    after: &Indicators,
    base: &Effects,
    synergy: Option<&Effects>,
) -> Vec<EffectChange> {
    before
        .iter()
        .filter_map(|indicator| {
            let name = indicator.name.as_str();
            let base_delta = base.get(name);
            let synergy_delta = synergy.and_then(|bonus| bonus.get(name));
            if base_delta.is_none() && synergy_delta.is_none() {
                return None;
            }
            let synergy_part = synergy_delta.unwrap_or(0);
            Some(EffectChange {
                indicator: name.to_string(),
                delta: base_delta.unwrap_or(0).saturating_add(synergy_part),
                synergy_delta: synergy_part,
                old_value: indicator.value,
                new_value: after.get(name).unwrap_or(indicator.value),
                synergy: synergy_delta.is_some(),
            })
        })
        .collect()
}
