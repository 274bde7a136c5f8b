use crate::checkpoint::{CheckpointEntry, CheckpointRecord, CheckpointStore};
use crate::config::Config;
use crate::error::{CheckpointError, HiveError, HiveResult};
use crate::optimizer::history::{IterationRecord, RunHistory};
use crate::optimizer::phases::{ColonyState, PhaseEngine};
use crate::optimizer::population::Bee;
use crate::optimizer::sampler::RandomSampler;
use std::time::{Duration, Instant};
use strum_macros::Display;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Uninitialized,
    Resuming,
    Initializing,
    Running,
    Completed,
    /// Stopped early by the progress callback or the time limit. A checkpoint
    /// was written, so the run can be resumed.
    Interrupted,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seed: Option<u64>,
    pub checkpoint_every: usize,
    /// Continue from the latest checkpoint when one exists.
    pub resume: bool,
    pub max_time: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: None,
            checkpoint_every: 10,
            resume: true,
            max_time: None,
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            seed: cfg.runtime.seed,
            checkpoint_every: cfg.checkpoint.checkpoint_every.max(1),
            resume: true,
            max_time: None, // Set manually if needed
        }
    }
}

/// Receives every completed iteration.
/// Boolean return value indicates if the search should continue (true) or stop (false).
pub trait ProgressCallback: Send + Sync {
    fn on_iteration(&self, record: &IterationRecord, best: &Bee) -> bool;
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_iteration(&self, _record: &IterationRecord, _best: &Bee) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub iterations: usize,
    pub resumed_from: Option<usize>,
    pub best: Bee,
    pub history: RunHistory,
}

/// Top-level run state machine:
/// `Uninitialized -> (Resuming | Initializing) -> Running -> Completed`,
/// with `Failed` on any fatal error and `Interrupted` on an early stop.
pub struct RunController {
    engine: PhaseEngine,
    store: Option<CheckpointStore>,
    options: RunOptions,
    state: RunState,
    colony: Option<ColonyState>,
    sampler: RandomSampler,
    resumed_from: Option<usize>,
}

impl RunController {
    pub fn new(engine: PhaseEngine, store: Option<CheckpointStore>, options: RunOptions) -> Self {
        let sampler = RandomSampler::new(options.seed);
        Self {
            engine,
            store,
            options,
            state: RunState::Uninitialized,
            colony: None,
            sampler,
            resumed_from: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn colony(&self) -> Option<&ColonyState> {
        self.colony.as_ref()
    }

    pub fn engine(&self) -> &PhaseEngine {
        &self.engine
    }

    /// Iteration the run was restored from, if it was resumed.
    pub fn resumed_from(&self) -> Option<usize> {
        self.resumed_from
    }

    /// Restores the latest checkpoint or evaluates a fresh random colony, then
    /// enters `Running`.
    pub fn start(&mut self) -> HiveResult<()> {
        if self.state != RunState::Uninitialized {
            return Err(HiveError::Config(format!(
                "cannot start a run that is already {}",
                self.state
            )));
        }
        if self.options.checkpoint_every == 0 {
            let invalid = Err(HiveError::Config("checkpoint_every must be positive".into()));
            return self.guard(invalid);
        }

        let latest = match (&self.store, self.options.resume) {
            (Some(store), true) => store.load_latest().map_err(HiveError::from),
            _ => Ok(None),
        };

        match self.guard(latest)? {
            Some(record) => {
                self.state = RunState::Resuming;
                let compatible = record
                    .params
                    .ensure_resumable_as(self.engine.params())
                    .map_err(|reason| {
                        warn!(
                            "⚠️  Refusing to resume from iteration {}: {}",
                            record.iteration, reason
                        );
                        HiveError::from(CheckpointError::Incompatible(reason))
                    });
                self.guard(compatible)?;

                let (_, colony, rng_state) = record.into_state();
                info!(
                    "♻️  Resuming after iteration {} (best cost {:.6e})",
                    colony.iteration, colony.best.cost
                );
                self.sampler = RandomSampler::from_state(rng_state);
                self.resumed_from = Some(colony.iteration);
                self.colony = Some(colony);
            }
            None => {
                self.state = RunState::Initializing;
                let params = self.engine.params();
                info!(
                    "🐝 Initializing colony: {} bees, {} onlookers, {} dimensions, L = {}",
                    params.n_pop,
                    params.n_onlooker,
                    params.n_var(),
                    params.trial_limit
                );
                let colony = self.engine.initialize(&mut self.sampler);
                let colony = self.guard(colony)?;
                info!("Initial best cost {:.6e}", colony.best.cost);
                self.colony = Some(colony);
            }
        }

        self.state = RunState::Running;
        Ok(())
    }

    /// Runs one iteration. Saves a checkpoint every `checkpoint_every`
    /// iterations and always at the final iteration, which completes the run.
    pub fn step(&mut self) -> HiveResult<IterationRecord> {
        if self.state != RunState::Running {
            return Err(HiveError::Config(format!(
                "cannot step a run that is {}",
                self.state
            )));
        }

        let result = match self.colony.as_mut() {
            Some(colony) => self.engine.iterate(colony, &mut self.sampler),
            None => Err(HiveError::Config("running without a colony".into())),
        };
        let record = self.guard(result)?;

        if record.iteration >= self.engine.params().max_iterations {
            self.finish(RunState::Completed)?;
        } else if record.iteration % self.options.checkpoint_every == 0 {
            // A missed periodic save is not fatal; the next one may succeed.
            if let Err(e) = self.save_checkpoint() {
                warn!(
                    "⚠️  Checkpoint at iteration {} failed: {}",
                    record.iteration, e
                );
            }
        }

        Ok(record)
    }

    /// Drives the run until it completes, is interrupted, or fails.
    pub fn run<CB: ProgressCallback>(&mut self, callback: &CB) -> HiveResult<RunOutcome> {
        if self.state == RunState::Uninitialized {
            self.start()?;
        }

        if let Some(colony) = &self.colony {
            let max = self.engine.params().max_iterations;
            if self.state == RunState::Running && colony.iteration >= max {
                info!(
                    "Restored run already finished {} of {} iterations",
                    colony.iteration, max
                );
                self.state = RunState::Completed;
            }
        }

        let started = Instant::now();
        while self.state == RunState::Running {
            if let Some(limit) = self.options.max_time {
                if started.elapsed() >= limit {
                    warn!("⏱️  Time limit of {:?} reached", limit);
                    self.finish(RunState::Interrupted)?;
                    break;
                }
            }

            let record = self.step()?;
            let keep_going = match &self.colony {
                Some(colony) => callback.on_iteration(&record, &colony.best),
                None => true,
            };

            if !keep_going && self.state == RunState::Running {
                info!("Stop requested after iteration {}", record.iteration);
                self.finish(RunState::Interrupted)?;
            }
        }

        self.outcome()
    }

    pub fn outcome(&self) -> HiveResult<RunOutcome> {
        let colony = self
            .colony
            .as_ref()
            .ok_or_else(|| HiveError::Config("run has no colony".into()))?;
        Ok(RunOutcome {
            state: self.state,
            iterations: colony.iteration,
            resumed_from: self.resumed_from,
            best: colony.best.clone(),
            history: colony.history.clone(),
        })
    }

    /// Writes the terminal checkpoint; if that fails the run is `Failed`.
    fn finish(&mut self, terminal: RunState) -> HiveResult<()> {
        let saved = self.save_checkpoint().map_err(HiveError::from);
        self.guard(saved)?;
        self.state = terminal;
        debug!("Run entered state {}", terminal);
        Ok(())
    }

    fn save_checkpoint(&self) -> Result<Option<CheckpointEntry>, CheckpointError> {
        let (Some(store), Some(colony)) = (&self.store, &self.colony) else {
            return Ok(None);
        };
        let record = CheckpointRecord::capture(self.engine.params(), colony, self.sampler.state());
        store.save(&record).map(Some)
    }

    fn guard<T>(&mut self, result: HiveResult<T>) -> HiveResult<T> {
        if let Err(e) = &result {
            error!("❌ Run failed: {}", e);
            self.state = RunState::Failed;
        }
        result
    }
}
