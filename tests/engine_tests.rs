mod common;

use common::{engine, small_params, AlwaysFails, Flaky, Sphere};
use hiveforge::optimizer::{
    Bee, IterationRecord, ProgressCallback, RandomSampler, RunController, RunOptions, RunState,
    SilentProgress,
};
use hiveforge::{EvaluationError, HiveError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_ten_iterations_on_sphere() {
    let params = small_params(10);
    let engine = engine(params.clone(), Arc::new(Sphere));
    let mut sampler = RandomSampler::new(Some(2024));
    let mut state = engine.initialize(&mut sampler).unwrap();
    let initial_best = state.best.cost;

    let mut previous_best = state.best.cost;
    for t in 1..=10 {
        let record = engine.iterate(&mut state, &mut sampler).unwrap();

        assert_eq!(record.iteration, t);
        assert_eq!(state.iteration, t);
        assert_eq!(state.history.len(), t);
        assert!(state.best.cost <= previous_best, "best cost rose at {}", t);
        previous_best = state.best.cost;

        assert!(state
            .population
            .trials()
            .iter()
            .all(|&trial| trial < params.trial_limit));
        for bee in state.population.bees() {
            assert!(params.bounds.contains(&bee.position));
            assert!(bee.cost >= state.best.cost);
        }

        assert_eq!(record.best_cost, state.best.cost);
        assert_eq!(record.best_parameters, state.best.position);
        assert_eq!(record.bees.len(), params.n_pop);
        assert!(record.employed_accepted <= params.n_pop);
        assert!(record.onlooker_accepted <= params.n_onlooker);
        assert!(record.best_aux.contains_key("norm"));
    }

    assert!(state.best.cost < initial_best);

    let trace = state.history.best_cost_trace();
    assert!(trace.windows(2).all(|w| w[1] <= w[0]));
    assert!(state.history.is_consistent());
}

#[test]
fn test_same_seed_gives_identical_history() {
    let run = || {
        let engine = engine(small_params(6), Arc::new(Sphere));
        let mut sampler = RandomSampler::new(Some(55));
        let mut state = engine.initialize(&mut sampler).unwrap();
        for _ in 0..6 {
            engine.iterate(&mut state, &mut sampler).unwrap();
        }
        state
    };
    assert_eq!(run(), run());
}

#[test]
fn test_failed_iteration_leaves_colony_untouched() {
    // Exactly enough healthy calls for the initial population.
    let engine = engine(small_params(10), Arc::new(Flaky::new(4)));
    let mut sampler = RandomSampler::new(Some(8));
    let mut state = engine.initialize(&mut sampler).unwrap();
    let before = state.clone();

    let err = engine.iterate(&mut state, &mut sampler).unwrap_err();
    assert!(matches!(
        err,
        HiveError::Evaluation(EvaluationError::Failed { .. })
    ));
    assert_eq!(state, before);
}

#[test]
fn test_batch_failure_reports_lowest_index() {
    let engine = engine(small_params(10), Arc::new(AlwaysFails));
    let mut sampler = RandomSampler::new(Some(8));
    match engine.initialize(&mut sampler) {
        Err(HiveError::Evaluation(e)) => assert_eq!(e.index(), 0),
        other => panic!("expected evaluation failure, got {:?}", other.map(|s| s.iteration)),
    }
}

#[test]
fn test_controller_fails_when_initial_evaluation_fails() {
    let mut controller = RunController::new(
        engine(small_params(10), Arc::new(AlwaysFails)),
        None,
        RunOptions {
            seed: Some(1),
            ..Default::default()
        },
    );
    assert!(controller.run(&SilentProgress).is_err());
    assert_eq!(controller.state(), RunState::Failed);
    assert!(controller.colony().is_none());
}

#[test]
fn test_controller_fails_mid_run_without_committing() {
    let mut controller = RunController::new(
        engine(small_params(10), Arc::new(Flaky::new(4))),
        None,
        RunOptions {
            seed: Some(1),
            ..Default::default()
        },
    );
    controller.start().unwrap();
    let before = controller.colony().cloned().unwrap();

    assert!(controller.step().is_err());
    assert_eq!(controller.state(), RunState::Failed);
    assert_eq!(controller.colony(), Some(&before));
    assert!(controller.step().is_err());
}

#[test]
fn test_controller_completes_at_max_iterations() {
    let mut controller = RunController::new(
        engine(small_params(7), Arc::new(Sphere)),
        None,
        RunOptions {
            seed: Some(3),
            ..Default::default()
        },
    );
    let outcome = controller.run(&SilentProgress).unwrap();
    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.iterations, 7);
    assert_eq!(outcome.history.len(), 7);
    assert_eq!(outcome.resumed_from, None);
    assert_eq!(outcome.history.last().unwrap().best_cost, outcome.best.cost);
}

struct StopAfter {
    limit: usize,
    seen: AtomicUsize,
}

impl ProgressCallback for StopAfter {
    fn on_iteration(&self, record: &IterationRecord, _best: &Bee) -> bool {
        self.seen.fetch_add(1, Ordering::SeqCst);
        record.iteration < self.limit
    }
}

#[test]
fn test_callback_can_interrupt() {
    let mut controller = RunController::new(
        engine(small_params(50), Arc::new(Sphere)),
        None,
        RunOptions {
            seed: Some(3),
            ..Default::default()
        },
    );
    let cb = StopAfter {
        limit: 3,
        seen: AtomicUsize::new(0),
    };
    let outcome = controller.run(&cb).unwrap();
    assert_eq!(outcome.state, RunState::Interrupted);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(cb.seen.load(Ordering::SeqCst), 3);
}

#[test]
fn test_zero_time_limit_interrupts_before_first_iteration() {
    let mut controller = RunController::new(
        engine(small_params(50), Arc::new(Sphere)),
        None,
        RunOptions {
            seed: Some(3),
            max_time: Some(Duration::ZERO),
            ..Default::default()
        },
    );
    let outcome = controller.run(&SilentProgress).unwrap();
    assert_eq!(outcome.state, RunState::Interrupted);
    assert_eq!(outcome.iterations, 0);
    assert!(outcome.history.is_empty());
}

#[test]
fn test_zero_checkpoint_cadence_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = hiveforge::checkpoint::CheckpointStore::open(dir.path(), 3).unwrap();
    let mut controller = RunController::new(
        engine(small_params(3), Arc::new(Sphere)),
        Some(store),
        RunOptions {
            seed: Some(3),
            checkpoint_every: 0,
            ..Default::default()
        },
    );
    let err = controller.run(&SilentProgress).unwrap_err();
    assert!(matches!(err, HiveError::Config(_)));
    assert_eq!(controller.state(), RunState::Failed);
    assert!(controller.colony().is_none());
}
