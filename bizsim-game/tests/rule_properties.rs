use std::collections::HashSet;
use std::sync::Arc;

use bizsim_game::{
    Catalog, Choice, DecisionError, DecisionSession, Effects, Phase, Requires, RunStatus,
    history_key,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const INDICATORS: [&str; 6] = [
    "Liquidez",
    "Rentabilidad",
    "Reputación",
    "Riesgo acumulado",
    "Sostenibilidad estratégica",
    "Untracked",
];
const OPTION_IDS: [&str; 4] = ["A", "B", "C", "D"];

fn random_effects(rng: &mut ChaCha20Rng) -> Effects {
    let count = rng.gen_range(0..=3);
    Effects::from_pairs((0..count).map(|_| {
        let name = INDICATORS[rng.gen_range(0..INDICATORS.len())];
        (name, rng.gen_range(-40..=40))
    }))
}

fn random_catalog(rng: &mut ChaCha20Rng) -> Catalog {
    let phase_count = rng.gen_range(1..=6u32);
    let mut earlier_keys: Vec<String> = Vec::new();
    let mut phases = Vec::new();
    for phase_id in 1..=phase_count {
        let option_count = rng.gen_range(1..=OPTION_IDS.len());
        let mut decisions = Vec::new();
        for (slot, option_id) in OPTION_IDS.iter().take(option_count).enumerate() {
            let mut choice = Choice::new(*option_id, format!("{option_id})"), random_effects(rng));
            // The first option stays ungated so a run can never get stuck.
            if slot > 0 && !earlier_keys.is_empty() && rng.gen_bool(0.4) {
                let needed = rng.gen_range(1..=2usize);
                let keys = (0..needed)
                    .map(|_| earlier_keys[rng.gen_range(0..earlier_keys.len())].clone());
                choice = choice.with_requires(Requires::all_of(keys));
            }
            if !earlier_keys.is_empty() && rng.gen_bool(0.4) {
                let source = earlier_keys[rng.gen_range(0..earlier_keys.len())].clone();
                choice = choice.with_synergy(source, random_effects(rng));
            }
            if rng.gen_bool(0.2) {
                choice = choice.with_unlocks(format!("unlock_{phase_id}_{option_id}"));
            }
            decisions.push(choice);
        }
        earlier_keys.extend(
            OPTION_IDS
                .iter()
                .take(option_count)
                .map(|option_id| history_key(phase_id, option_id)),
        );
        phases.push(Phase {
            id: phase_id,
            title: format!("Phase {phase_id}"),
            question: String::from("?"),
            decisions,
        });
    }
    Catalog::from_phases(phases)
}

fn play_random_run(seed: u64) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let catalog = Arc::new(random_catalog(&mut rng));
    let mut session = DecisionSession::new(Arc::clone(&catalog));

    let mut prior_history: HashSet<String> = HashSet::new();
    let mut prior_synergies: HashSet<String> = HashSet::new();
    loop {
        let phase = session
            .visible_phase()
            .expect("active run always has a phase");
        let before_index = session.progress().phase_index;
        let pick = rng.gen_range(0..phase.options.len());
        let outcome = session.apply_decision(pick).expect("visible option accepted");

        for indicator in session.indicators().iter() {
            assert!(
                (0..=100).contains(&indicator.value),
                "seed {seed}: {} = {}",
                indicator.name,
                indicator.value
            );
        }
        assert!(session.history().contains(&outcome.history_key));
        assert!(prior_history.is_subset(session.history()));
        assert!(prior_synergies.is_subset(session.applied_synergies()));
        prior_history = session.history().clone();
        prior_synergies = session.applied_synergies().clone();

        for change in &outcome.effects {
            assert_eq!(
                session.indicators().get(&change.indicator),
                Some(change.new_value)
            );
        }

        let after_index = session.progress().phase_index;
        match outcome.status {
            RunStatus::Failed => {
                assert!(outcome.game_over);
                assert!(!outcome.failed_indicators.is_empty());
                assert_eq!(after_index, before_index);
            }
            RunStatus::Completed => {
                assert!(outcome.game_completed);
                assert!(outcome.failed_indicators.is_empty());
                assert_eq!(before_index + 1, catalog.len());
                assert_eq!(after_index, before_index);
            }
            RunStatus::Active => {
                assert!(outcome.failed_indicators.is_empty());
                assert_eq!(after_index, before_index + 1);
            }
        }

        if outcome.status.is_terminal() {
            let frozen = session.state().clone();
            assert_eq!(
                session.apply_decision(0),
                Err(DecisionError::InvalidState {
                    status: outcome.status
                })
            );
            assert_eq!(session.state(), &frozen);
            break;
        }
    }
}

#[test]
fn random_catalogs_respect_run_invariants() {
    for seed in 0..500 {
        play_random_run(seed);
    }
}

#[test]
fn visible_phase_is_read_only() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x00C0_FFEE);
    let session = DecisionSession::new(Arc::new(random_catalog(&mut rng)));
    let before = session.state().clone();
    let first = session.visible_phase();
    for _ in 0..10 {
        assert_eq!(session.visible_phase(), first);
    }
    assert_eq!(session.state(), &before);
}
