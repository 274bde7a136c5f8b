use crate::reports;
use clap::{ArgMatches, Args};
use hiveforge::checkpoint::CheckpointStore;
use hiveforge::config::Config;
use hiveforge::objectives::{BenchmarkFunction, BenchmarkObjective};
use hiveforge::optimizer::{
    Bee, EvaluationPool, Hyperparameters, IterationRecord, PhaseEngine, ProgressCallback,
    RunController, RunOptions,
};
use hiveforge::HiveResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: Config,

    /// Benchmark landscape to minimize
    #[arg(short = 'o', long, default_value = "sphere")]
    pub objective: BenchmarkFunction,

    /// Ignore existing checkpoints and start from a fresh colony
    #[arg(long, default_value_t = false)]
    pub no_resume: bool,

    /// Wall-clock limit in seconds; the run is checkpointed and interrupted
    #[arg(short = 'T', long)]
    pub time: Option<u64>,

    /// Write the per-iteration history to this CSV file
    #[arg(long)]
    pub history_csv: Option<PathBuf>,

    /// Log progress every N iterations
    #[arg(long, default_value_t = 1)]
    pub report_every: usize,
}

struct CliLogger {
    every: usize,
}

impl ProgressCallback for CliLogger {
    fn on_iteration(&self, record: &IterationRecord, best: &Bee) -> bool {
        if record.iteration % self.every == 0 {
            info!(
                "Iter {:5} | Best: {:.6e} | Mean: {:.4e} | Std: {:.3e} | Div: {:.4} | Scouts: {}",
                record.iteration,
                best.cost,
                record.mean_cost,
                record.std_cost,
                record.diversity,
                record.scout_count
            );
        }
        true
    }
}

pub fn run(args: &RunArgs, config_file: Option<&Path>, matches: &ArgMatches) -> HiveResult<()> {
    let config = match config_file {
        Some(path) => {
            info!("📂 Loading config: {}", path.display());
            let mut file_config = Config::load_from_file(path)?;
            file_config.merge_from_cli(&args.config, matches);
            file_config
        }
        None => args.config.clone(),
    };
    config.validate()?;

    let params = Hyperparameters::try_from(&config)?;
    let pool = EvaluationPool::new(
        config.runtime.workers,
        config.runtime.eval_timeout_ms.map(Duration::from_millis),
    )?;
    info!(
        "🚀 Minimizing {} in {} dimensions with {} workers",
        args.objective,
        params.n_var(),
        pool.workers()
    );

    let engine = PhaseEngine::new(
        params,
        pool,
        Arc::new(BenchmarkObjective::new(args.objective)),
    )?;
    let store = CheckpointStore::open(
        &config.checkpoint.checkpoint_dir,
        config.checkpoint.checkpoint_keep,
    )?;

    let mut options = RunOptions::from(&config);
    options.resume = !args.no_resume;
    options.max_time = args.time.map(Duration::from_secs);

    let mut controller = RunController::new(engine, Some(store), options);
    let outcome = controller.run(&CliLogger {
        every: args.report_every.max(1),
    })?;

    reports::history_table(&outcome.history, 10);
    reports::best_table(&outcome.best);

    if let Some(path) = &args.history_csv {
        reports::write_history_csv(path, &outcome.history)?;
        info!("📝 History written to {}", path.display());
    }

    info!("=== 🏆 FINAL RESULT ===");
    info!("State: {}", outcome.state);
    match outcome.resumed_from {
        Some(from) => info!("Iterations: {} (resumed after {})", outcome.iterations, from),
        None => info!("Iterations: {}", outcome.iterations),
    }
    info!("Best position: {:?}", outcome.best.position);
    info!("Best cost: {:.6e}", outcome.best.cost);
    Ok(())
}
