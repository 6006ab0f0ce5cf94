use std::fmt;

use bizsim_game::{
    Choice, DecisionSession, VisibleOption, VisiblePhase, clamp_indicator, history_key,
    synergy_activation_id,
};
use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub option_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(option_index: usize, rationale: Option<String>) -> Self {
        Self {
            option_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the visible options of the current phase.
    fn pick_option(&mut self, session: &DecisionSession, phase: &VisiblePhase) -> PolicyDecision;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    Conservative,
    Aggressive,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::Conservative,
        Self::Aggressive,
        Self::Balanced,
        Self::Random,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Conservative => "Conservative",
            GameplayStrategy::Aggressive => "Aggressive",
            GameplayStrategy::Balanced => "Balanced",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            GameplayStrategy::Conservative => "keeps the weakest indicator as high as possible",
            GameplayStrategy::Aggressive => "chases the largest single gain, synergies included",
            GameplayStrategy::Balanced => "maximises the net change across all indicators",
            GameplayStrategy::Random => "uniform pick among visible options (seeded)",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Conservative => Box::new(ConservativePolicy),
            GameplayStrategy::Aggressive => Box::new(AggressivePolicy),
            GameplayStrategy::Balanced => Box::new(BalancedPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ConservativePolicy;
struct AggressivePolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for ConservativePolicy {
    fn name(&self) -> &'static str {
        "Conservative"
    }

    fn pick_option(&mut self, session: &DecisionSession, phase: &VisiblePhase) -> PolicyDecision {
        let (idx, floor) = phase
            .options
            .iter()
            .map(|option| (option.index, projected_floor(session, phase, option)))
            .max_by(|(a_idx, a), (b_idx, b)| a.cmp(b).then(b_idx.cmp(a_idx)))
            .unwrap_or((0, 0));
        PolicyDecision::new(idx, Some(format!("floor {floor}")))
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn pick_option(&mut self, session: &DecisionSession, phase: &VisiblePhase) -> PolicyDecision {
        let (idx, reward) = phase
            .options
            .iter()
            .map(|option| {
                let reward = projected_deltas(session, phase, option)
                    .into_iter()
                    .map(|(_, delta)| delta)
                    .max()
                    .unwrap_or(0);
                (option.index, reward)
            })
            .max_by(|(a_idx, a), (b_idx, b)| a.cmp(b).then(b_idx.cmp(a_idx)))
            .unwrap_or((0, 0));
        PolicyDecision::new(idx, Some(format!("reward {reward}")))
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_option(&mut self, session: &DecisionSession, phase: &VisiblePhase) -> PolicyDecision {
        let (idx, score) = phase
            .options
            .iter()
            .map(|option| {
                let score: i32 = projected_deltas(session, phase, option)
                    .into_iter()
                    .map(|(_, delta)| delta)
                    .sum();
                (option.index, score)
            })
            .max_by(|(a_idx, a), (b_idx, b)| a.cmp(b).then(b_idx.cmp(a_idx)))
            .unwrap_or((0, 0));
        PolicyDecision::new(idx, Some(format!("score {score}")))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_option(&mut self, _session: &DecisionSession, phase: &VisiblePhase) -> PolicyDecision {
        if phase.options.is_empty() {
            return PolicyDecision::new(0, Some("no options".to_string()));
        }
        let idx = self.rng.gen_range(0..phase.options.len());
        PolicyDecision::new(idx, None)
    }
}

fn catalog_choice<'a>(
    session: &'a DecisionSession,
    phase: &VisiblePhase,
    option: &VisibleOption,
) -> Option<&'a Choice> {
    session
        .catalog()
        .phase(phase.index)?
        .decisions
        .iter()
        .find(|choice| choice.id == option.id)
}

/// Per-indicator change the option would request, counting a synergy bonus
/// only when it would actually fire. Unknown indicators are left out.
fn projected_deltas(
    session: &DecisionSession,
    phase: &VisiblePhase,
    option: &VisibleOption,
) -> Vec<(String, i32)> {
    let Some(choice) = catalog_choice(session, phase, option) else {
        return Vec::new();
    };
    let indicators = session.indicators();
    let mut deltas: Vec<(String, i32)> = Vec::new();
    let mut add = |name: &str, delta: i32| {
        if !indicators.contains(name) {
            return;
        }
        match deltas.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, total)) => *total += delta,
            None => deltas.push((name.to_string(), delta)),
        }
    };
    for (name, delta) in choice.effects.iter() {
        add(name, delta);
    }
    if let Some((source, bonus)) = choice.synergy() {
        let consumer = history_key(phase.id, &choice.id);
        let activation = synergy_activation_id(source, &consumer);
        if session.history().contains(source) && !session.applied_synergies().contains(&activation)
        {
            for (name, delta) in bonus.iter() {
                add(name, delta);
            }
        }
    }
    deltas
}

/// Lowest indicator value after taking the option, clamped.
fn projected_floor(session: &DecisionSession, phase: &VisiblePhase, option: &VisibleOption) -> i32 {
    let deltas = projected_deltas(session, phase, option);
    session
        .indicators()
        .iter()
        .map(|indicator| {
            let delta = deltas
                .iter()
                .find(|(name, _)| *name == indicator.name)
                .map_or(0, |(_, delta)| *delta);
            clamp_indicator(indicator.value.saturating_add(delta))
        })
        .min()
        .unwrap_or(0)
}
