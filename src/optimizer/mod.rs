pub mod bounds;
pub mod evaluation;
pub mod history;
pub mod phases;
pub mod population;
pub mod runner;
pub mod sampler;
pub mod selection;

pub use self::bounds::Bounds;
pub use self::evaluation::{AuxMetrics, Evaluation, EvaluationPool, ObjectiveEvaluator};
pub use self::history::{IterationRecord, RunHistory};
pub use self::phases::{ColonyState, PhaseEngine};
pub use self::population::{Bee, Population};
pub use self::runner::{
    ProgressCallback, RunController, RunOptions, RunOutcome, RunState, SilentProgress,
};
pub use self::sampler::RandomSampler;
pub use self::selection::SelectionSampler;

use crate::config::Config;
use crate::error::HiveError;
use serde::{Deserialize, Serialize};

/// The algorithm settings a run is defined by. Stored in every checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub n_pop: usize,
    pub n_onlooker: usize,
    /// Abandonment limit `L`: a slot is scouted once its trial counter reaches it.
    pub trial_limit: usize,
    /// Perturbation scale `a`; `phi` is drawn from `a * U(-1, 1)`.
    pub accel: f64,
    pub bounds: Bounds,
    pub max_iterations: usize,
}

impl Hyperparameters {
    /// `round(0.6 * n_var * n_pop)`, never below 1.
    pub fn default_trial_limit(n_var: usize, n_pop: usize) -> usize {
        ((0.6 * n_var as f64 * n_pop as f64).round() as usize).max(1)
    }

    pub fn n_var(&self) -> usize {
        self.bounds.dims()
    }

    pub fn validate(&self) -> Result<(), HiveError> {
        if self.n_pop < 2 {
            return Err(HiveError::Config(format!(
                "n_pop must be at least 2 (got {})",
                self.n_pop
            )));
        }
        if self.n_onlooker == 0 {
            return Err(HiveError::Config("n_onlooker must be positive".into()));
        }
        if self.trial_limit == 0 {
            return Err(HiveError::Config("trial_limit must be positive".into()));
        }
        if !self.accel.is_finite() || self.accel <= 0.0 {
            return Err(HiveError::Config(format!(
                "accel must be a positive number (got {})",
                self.accel
            )));
        }
        if self.max_iterations == 0 {
            return Err(HiveError::Config("max_iterations must be positive".into()));
        }
        Bounds::new(self.bounds.min().to_vec(), self.bounds.max().to_vec())?;
        Ok(())
    }

    /// Checks that a run recorded with `self` can continue under `other`.
    /// Only `max_iterations` may differ.
    pub fn ensure_resumable_as(&self, other: &Hyperparameters) -> Result<(), String> {
        let mut mismatches = Vec::new();
        if self.n_pop != other.n_pop {
            mismatches.push(format!("n_pop {} != {}", self.n_pop, other.n_pop));
        }
        if self.n_onlooker != other.n_onlooker {
            mismatches.push(format!(
                "n_onlooker {} != {}",
                self.n_onlooker, other.n_onlooker
            ));
        }
        if self.trial_limit != other.trial_limit {
            mismatches.push(format!(
                "trial_limit {} != {}",
                self.trial_limit, other.trial_limit
            ));
        }
        if self.accel != other.accel {
            mismatches.push(format!("accel {} != {}", self.accel, other.accel));
        }
        if self.bounds != other.bounds {
            mismatches.push("bounds differ".to_string());
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(mismatches.join(", "))
        }
    }
}

impl TryFrom<&Config> for Hyperparameters {
    type Error = HiveError;

    fn try_from(cfg: &Config) -> Result<Self, Self::Error> {
        let bounds = cfg.bounds.resolve()?;
        let trial_limit = cfg
            .colony
            .trial_limit
            .unwrap_or_else(|| Self::default_trial_limit(bounds.dims(), cfg.colony.n_pop));

        let params = Self {
            n_pop: cfg.colony.n_pop,
            n_onlooker: cfg.colony.n_onlooker,
            trial_limit,
            accel: cfg.colony.accel,
            bounds,
            max_iterations: cfg.colony.max_iterations,
        };
        params.validate()?;
        Ok(params)
    }
}
