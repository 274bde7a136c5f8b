#![allow(dead_code)]

use hiveforge::optimizer::{
    Bounds, Evaluation, EvaluationPool, Hyperparameters, ObjectiveEvaluator, PhaseEngine,
};
use hiveforge::ObjectiveFailure;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct Sphere;

impl ObjectiveEvaluator for Sphere {
    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, ObjectiveFailure> {
        let sq: f64 = x.iter().map(|v| v * v).sum();
        Ok(Evaluation::new(sq).with_metric("norm", sq.sqrt()))
    }
}

pub struct AlwaysFails;

impl ObjectiveEvaluator for AlwaysFails {
    fn evaluate(&self, _x: &[f64]) -> Result<Evaluation, ObjectiveFailure> {
        Err(ObjectiveFailure::new("solver diverged"))
    }
}

/// Succeeds for the first `healthy` calls, then fails every call.
pub struct Flaky {
    healthy: usize,
    calls: AtomicUsize,
}

impl Flaky {
    pub fn new(healthy: usize) -> Self {
        Self {
            healthy,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ObjectiveEvaluator for Flaky {
    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, ObjectiveFailure> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.healthy {
            Ok(Evaluation::new(x.iter().map(|v| v * v).sum()))
        } else {
            Err(ObjectiveFailure::new("license server unreachable"))
        }
    }
}

/// nVar = 2, nPop = 4, nOnlooker = 2, L = 3, bounds [-5, 5].
pub fn small_params(max_iterations: usize) -> Hyperparameters {
    Hyperparameters {
        n_pop: 4,
        n_onlooker: 2,
        trial_limit: 3,
        accel: 1.0,
        bounds: Bounds::uniform(2, -5.0, 5.0).unwrap(),
        max_iterations,
    }
}

pub fn engine(params: Hyperparameters, evaluator: Arc<dyn ObjectiveEvaluator>) -> PhaseEngine {
    PhaseEngine::new(params, EvaluationPool::new(2, None).unwrap(), evaluator).unwrap()
}
