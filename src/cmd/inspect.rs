use crate::reports;
use clap::Args;
use hiveforge::checkpoint::CheckpointStore;
use hiveforge::{HiveError, HiveResult};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Show this iteration instead of the latest checkpoint
    #[arg(short, long)]
    pub iteration: Option<usize>,

    /// Write the stored history to this CSV file
    #[arg(long)]
    pub history_csv: Option<PathBuf>,
}

pub fn run(args: &InspectArgs) -> HiveResult<()> {
    if !args.checkpoint_dir.is_dir() {
        return Err(HiveError::Config(format!(
            "checkpoint directory '{}' does not exist",
            args.checkpoint_dir.display()
        )));
    }

    let store = CheckpointStore::open(&args.checkpoint_dir, usize::MAX)?;
    let entries = store.entries()?;
    reports::checkpoint_table(&entries);

    let record = match args.iteration {
        Some(iteration) => store.load(iteration)?,
        None => match store.load_latest()? {
            Some(record) => record,
            None => {
                warn!("⚠️  No checkpoints in {}", args.checkpoint_dir.display());
                return Ok(());
            }
        },
    };

    info!(
        "🔎 Checkpoint at iteration {}: {} bees, {} dimensions, L = {}",
        record.iteration,
        record.params.n_pop,
        record.params.n_var(),
        record.params.trial_limit
    );
    reports::history_table(&record.history, 10);
    reports::best_table(&record.best);

    if let Some(path) = &args.history_csv {
        reports::write_history_csv(path, &record.history)?;
        info!("📝 History written to {}", path.display());
    }
    Ok(())
}
