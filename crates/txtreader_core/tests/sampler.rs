use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use txtreader_core::{reset_all, ResetCause, SamplerBook, SamplerPhase, SamplerState};

fn population(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

#[test]
fn draws_are_a_permutation_then_the_cycle_restarts() {
    let files = population(&["A", "B", "C"]);
    let mut state = SamplerState::default();
    let mut rng = StdRng::seed_from_u64(7);

    let mut picks = BTreeSet::new();
    for _ in 0..3 {
        let outcome = state.draw(files.clone(), &mut rng, 1);
        picks.insert(outcome.pick.expect("pick"));
    }
    assert_eq!(picks, files);
    assert_eq!(state.phase(), SamplerPhase::Exhausted);

    let fourth = state.draw(files.clone(), &mut rng, 2);
    assert_eq!(fourth.reset, Some(ResetCause::Exhausted));
    assert!(files.contains(fourth.pick.as_deref().unwrap()));
    assert_eq!(state.drawn.len(), 1);
}

#[test]
fn population_change_clears_drawn() {
    let mut state = SamplerState::default();
    let mut rng = StdRng::seed_from_u64(1);
    state.draw(population(&["A", "B", "C"]), &mut rng, 1);
    state.draw(population(&["A", "B", "C"]), &mut rng, 1);

    let grown = population(&["A", "B", "C", "D"]);
    let outcome = state.draw(grown.clone(), &mut rng, 2);
    assert_eq!(outcome.reset, Some(ResetCause::PopulationChanged));
    assert_eq!(state.all_known, grown);
    assert_eq!(state.drawn.len(), 1);

    let shrunk = population(&["A", "B"]);
    let outcome = state.draw(shrunk.clone(), &mut rng, 3);
    assert_eq!(outcome.reset, Some(ResetCause::PopulationChanged));
    assert_eq!(state.all_known, shrunk);
}

#[test]
fn empty_population_draws_nothing() {
    let mut state = SamplerState::default();
    let mut rng = StdRng::seed_from_u64(3);
    let outcome = state.draw(BTreeSet::new(), &mut rng, 1);

    assert_eq!(outcome.pick, None);
    assert_eq!(state.phase(), SamplerPhase::Empty);
}

#[test]
fn drawn_entries_outside_population_are_dropped() {
    let mut state = SamplerState {
        all_known: population(&["A", "B"]),
        drawn: population(&["A", "stale"]),
        ..Default::default()
    };
    assert!(!state.sync_population(population(&["A", "B"])));
    assert_eq!(state.drawn, population(&["A"]));
    assert_eq!(state.phase(), SamplerPhase::Sampling);
}

#[test]
fn reset_all_clears_every_directory() {
    let mut book = SamplerBook::new();
    let mut rng = StdRng::seed_from_u64(5);
    for dir in ["/one", "/two"] {
        let mut state = SamplerState::default();
        state.draw(population(&["x", "y"]), &mut rng, 1);
        book.insert(dir.to_string(), state);
    }

    reset_all(&mut book);
    assert!(book.values().all(|state| state.drawn.is_empty()));
    assert!(book.values().all(|state| state.all_known.len() == 2));
}
