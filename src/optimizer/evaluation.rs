use crate::error::{EvaluationError, HiveError, HiveResult, ObjectiveFailure};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Named auxiliary metrics an objective reports next to its cost.
pub type AuxMetrics = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub cost: f64,
    #[serde(default)]
    pub aux: AuxMetrics,
}

impl Evaluation {
    pub fn new(cost: f64) -> Self {
        Self {
            cost,
            aux: AuxMetrics::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.aux.insert(name.into(), value);
        self
    }
}

/// The black box being minimized. Called concurrently from pool workers, so
/// it must not hold unsynchronized mutable state.
pub trait ObjectiveEvaluator: Send + Sync {
    fn evaluate(&self, position: &[f64]) -> Result<Evaluation, ObjectiveFailure>;
}

impl<F> ObjectiveEvaluator for F
where
    F: Fn(&[f64]) -> Result<Evaluation, ObjectiveFailure> + Send + Sync,
{
    fn evaluate(&self, position: &[f64]) -> Result<Evaluation, ObjectiveFailure> {
        self(position)
    }
}

/// Fixed-size worker pool for batch evaluation. Results come back aligned with
/// the submitted batch and only once every unit has finished.
pub struct EvaluationPool {
    pool: rayon::ThreadPool,
    timeout: Option<Duration>,
}

impl EvaluationPool {
    /// `workers == 0` sizes the pool to the available hardware concurrency.
    pub fn new(workers: usize, timeout: Option<Duration>) -> HiveResult<Self> {
        let num_threads = if workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            workers
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("hive-eval-{}", i))
            .build()
            .map_err(|e| HiveError::Config(format!("cannot build worker pool: {}", e)))?;

        Ok(Self { pool, timeout })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Evaluates every position in parallel. Any failing unit fails the whole
    /// batch; the reported error is the one with the lowest batch index.
    pub fn evaluate_batch<E>(
        &self,
        evaluator: &E,
        batch: &[Vec<f64>],
    ) -> Result<Vec<Evaluation>, EvaluationError>
    where
        E: ObjectiveEvaluator + ?Sized,
    {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Dispatching batch of {} to {} workers", batch.len(), self.workers());

        let outcomes: Vec<Result<Evaluation, EvaluationError>> = self.pool.install(|| {
            batch
                .par_iter()
                .enumerate()
                .map(|(index, position)| self.evaluate_unit(evaluator, index, position))
                .collect()
        });

        outcomes.into_iter().collect()
    }

    fn evaluate_unit<E>(
        &self,
        evaluator: &E,
        index: usize,
        position: &[f64],
    ) -> Result<Evaluation, EvaluationError>
    where
        E: ObjectiveEvaluator + ?Sized,
    {
        let started = Instant::now();
        let evaluation = evaluator
            .evaluate(position)
            .map_err(|source| EvaluationError::Failed { index, source })?;

        // Calls are not preempted; an overrunning result is discarded on return.
        if let Some(limit) = self.timeout {
            if started.elapsed() > limit {
                return Err(EvaluationError::TimedOut { index, limit });
            }
        }

        if !evaluation.cost.is_finite() {
            return Err(EvaluationError::NonFiniteCost {
                index,
                cost: evaluation.cost,
            });
        }

        Ok(evaluation)
    }
}
