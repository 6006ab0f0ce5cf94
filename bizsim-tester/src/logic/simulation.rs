use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use bizsim_game::{
    DecisionError, DecisionOutcome, DecisionSession, FinalResults, RunState, RunStatus,
};

use super::policy::GameplayStrategy;

/// One decision taken during an automated run.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub phase_id: u32,
    pub option_id: String,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Everything observed about a single automated run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub status: RunStatus,
    pub decisions: Vec<DecisionRecord>,
    pub synergies_applied: usize,
    pub results: FinalResults,
    pub violations: Vec<String>,
}

/// Aggregated outcome of one strategy over one seed.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub completed_runs: usize,
    pub failed_runs: usize,
    pub mean_score: f64,
    pub categories: BTreeMap<String, usize>,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

/// Plays strategies against a prototype session and checks run invariants.
pub struct StrategyRunner {
    prototype: DecisionSession,
    verbose: bool,
}

impl StrategyRunner {
    #[must_use]
    pub fn new(mut prototype: DecisionSession, verbose: bool) -> Self {
        prototype.reset();
        Self { prototype, verbose }
    }

    pub fn run_strategy(
        &self,
        strategy: GameplayStrategy,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing strategy: {} (seed: {seed})",
                        strategy.label().bright_white()
                    );
                }
                self.run_single_strategy(strategy, seed, iterations)
            })
            .collect()
    }

    fn run_single_strategy(
        &self,
        strategy: GameplayStrategy,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut completed_runs = 0;
        let mut failed_runs = 0;
        let mut score_total = 0.0;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = self.play_run(strategy, iteration_seed);
            durations.push(start_time.elapsed());

            *categories
                .entry(summary.results.category.to_string())
                .or_default() += 1;
            score_total += summary.results.average_score;
            match summary.status {
                RunStatus::Completed => completed_runs += 1,
                RunStatus::Failed => failed_runs += 1,
                RunStatus::Active => {}
            }

            if summary.violations.is_empty() {
                successes += 1;
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} {} score {:.1} ({}) path {}",
                        i + 1,
                        iterations,
                        summary.status,
                        summary.results.average_score,
                        summary.results.category,
                        describe_path(&summary)
                    );
                }
            } else {
                let message = format!(
                    "Iteration {} (strategy {}, seed {}, status {}): {} | {}",
                    i + 1,
                    strategy.label(),
                    summary.seed,
                    summary.status,
                    summary.violations.join("; "),
                    describe_path(&summary)
                );
                if self.verbose {
                    println!("  ❌ {}", message.red());
                }
                failures.push(message);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let mean_score = if iterations == 0 {
            0.0
        } else {
            score_total / iterations as f64
        };
        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: format!("{} (seed {seed})", strategy.label()),
            strategy,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            completed_runs,
            failed_runs,
            mean_score,
            categories,
            failures,
            average_duration,
        }
    }

    /// Play one run to its end with the given strategy.
    pub fn play_run(&self, strategy: GameplayStrategy, seed: u64) -> RunSummary {
        let mut session = self.prototype.clone();
        let mut policy = strategy.create_policy(seed);
        let mut decisions = Vec::new();
        let mut violations = Vec::new();
        let total_phases = session.progress().total_phases;

        while session.status() == RunStatus::Active {
            if decisions.len() >= total_phases {
                violations.push(format!(
                    "run still active after {} decisions over {total_phases} phases",
                    decisions.len()
                ));
                break;
            }
            let Some(phase) = session.visible_phase() else {
                violations.push("active run has no phase to show".to_string());
                break;
            };
            if phase.options.is_empty() {
                violations.push(format!("phase {} has no visible options", phase.id));
                break;
            }

            let decision = policy.pick_option(&session, &phase);
            let index = decision.option_index.min(phase.options.len() - 1);
            let option_id = phase.options[index].id.clone();
            let before = session.state().clone();

            match session.apply_decision(index) {
                Ok(outcome) => {
                    log::debug!(
                        "{} picked {} in phase {}: {:?}",
                        policy.name(),
                        option_id,
                        phase.id,
                        outcome.status
                    );
                    check_step(&session, &before, &outcome, &mut violations);
                }
                Err(err) => {
                    violations.push(format!("phase {} option {option_id}: {err}", phase.id));
                    break;
                }
            }

            decisions.push(DecisionRecord {
                phase_id: phase.id,
                option_id,
                policy_name: policy.name().to_string(),
                rationale: decision.rationale,
            });
        }

        let status = session.status();
        if status.is_terminal() {
            let frozen = session.state().clone();
            match session.apply_decision(0) {
                Err(DecisionError::InvalidState { .. }) => {}
                other => violations.push(format!("terminal run accepted a decision: {other:?}")),
            }
            if session.state() != &frozen {
                violations.push("rejected decision mutated the run".to_string());
            }
        }
        if status == RunStatus::Completed && decisions.len() != total_phases {
            violations.push(format!(
                "completed after {} decisions over {total_phases} phases",
                decisions.len()
            ));
        }

        RunSummary {
            strategy,
            seed,
            status,
            decisions,
            synergies_applied: session.applied_synergies().len(),
            results: session.final_results(),
            violations,
        }
    }
}

fn check_step(
    session: &DecisionSession,
    before: &RunState,
    outcome: &DecisionOutcome,
    violations: &mut Vec<String>,
) {
    for indicator in session.indicators().iter() {
        if !(0..=100).contains(&indicator.value) {
            violations.push(format!(
                "{} out of bounds: {}",
                indicator.name, indicator.value
            ));
        }
    }
    if !before.history().is_subset(session.history()) {
        violations.push("history lost entries".to_string());
    }
    if !before
        .applied_synergies()
        .is_subset(session.applied_synergies())
    {
        violations.push("applied synergies lost entries".to_string());
    }
    let advanced = session.progress().phase_index != before.phase_index();
    match outcome.status {
        RunStatus::Active if !advanced => {
            violations.push("active run did not advance".to_string());
        }
        RunStatus::Failed | RunStatus::Completed if advanced => {
            violations.push(format!("pointer moved on {}", outcome.status));
        }
        RunStatus::Failed if outcome.failed_indicators.is_empty() => {
            violations.push("failed without a failed indicator".to_string());
        }
        _ => {}
    }
}

fn describe_path(summary: &RunSummary) -> String {
    if summary.decisions.is_empty() {
        return "no decisions recorded".to_string();
    }
    summary
        .decisions
        .iter()
        .map(|entry| format!("{}{}", entry.phase_id, entry.option_id))
        .collect::<Vec<_>>()
        .join(" -> ")
}

mod duration_serde {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizsim_game::{GameEngine, JsonCatalogLoader};

    fn runner() -> StrategyRunner {
        let session = GameEngine::new(JsonCatalogLoader::bundled()).new_session();
        StrategyRunner::new(session, false)
    }

    #[test]
    fn every_strategy_completes_bundled_catalog() {
        let runner = runner();
        for strategy in GameplayStrategy::ALL {
            let summary = runner.play_run(strategy, 1337);
            assert!(summary.violations.is_empty(), "{:?}", summary.violations);
            assert_eq!(summary.status, RunStatus::Completed);
            assert_eq!(summary.decisions.len(), 5);
        }
    }

    #[test]
    fn scenario_result_aggregates_iterations() {
        let runner = runner();
        let results = runner.run_strategy(GameplayStrategy::Random, &[1, 2], 4);
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(result.passed);
            assert_eq!(result.iterations_run, 4);
            assert_eq!(result.successful_iterations, 4);
            assert_eq!(result.completed_runs, 4);
            assert_eq!(result.categories.values().sum::<usize>(), 4);
        }
    }

    #[test]
    fn runner_starts_from_a_fresh_run() {
        let mut session = GameEngine::new(JsonCatalogLoader::bundled()).new_session();
        session.apply_decision(0).unwrap();
        let runner = StrategyRunner::new(session, false);
        let summary = runner.play_run(GameplayStrategy::Balanced, 0);
        assert_eq!(summary.decisions.len(), 5);
    }

    #[test]
    fn deterministic_strategies_repeat_the_same_path() {
        let runner = runner();
        let first = runner.play_run(GameplayStrategy::Conservative, 1);
        let second = runner.play_run(GameplayStrategy::Conservative, 2);
        let ids = |s: &RunSummary| {
            s.decisions
                .iter()
                .map(|d| d.option_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }
}
