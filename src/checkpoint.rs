use crate::error::CheckpointError;
use crate::optimizer::{Bee, ColonyState, Hyperparameters, Population, RunHistory};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;
const FILE_PREFIX: &str = "checkpoint-";
const FILE_SUFFIX: &str = ".json";

/// Self-contained snapshot of a run after `iteration` completed iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub iteration: usize,
    pub params: Hyperparameters,
    pub population: Population,
    pub best: Bee,
    pub history: RunHistory,
    /// Random generator state to continue the stream from.
    pub rng_state: u64,
}

impl CheckpointRecord {
    pub fn capture(params: &Hyperparameters, state: &ColonyState, rng_state: u64) -> Self {
        Self {
            iteration: state.iteration,
            params: params.clone(),
            population: state.population.clone(),
            best: state.best.clone(),
            history: state.history.clone(),
            rng_state,
        }
    }

    pub fn into_state(self) -> (Hyperparameters, ColonyState, u64) {
        (
            self.params,
            ColonyState {
                iteration: self.iteration,
                population: self.population,
                best: self.best,
                history: self.history,
            },
            self.rng_state,
        )
    }

    /// Structural checks a record must pass before it can seed a run.
    pub fn check_consistency(&self) -> Result<(), String> {
        self.params.validate().map_err(|e| e.to_string())?;

        let n_var = self.params.n_var();
        if self.population.len() != self.params.n_pop {
            return Err(format!(
                "population has {} bees, expected {}",
                self.population.len(),
                self.params.n_pop
            ));
        }
        if self.population.trials().len() != self.population.len() {
            return Err("trial counters are not aligned with the population".into());
        }
        for (slot, bee) in self.population.bees().iter().enumerate() {
            if !self.params.bounds.contains(&bee.position) {
                return Err(format!("bee {} lies outside the {}-d bounds", slot, n_var));
            }
            if !bee.cost.is_finite() {
                return Err(format!("bee {} has non-finite cost", slot));
            }
        }
        if !self.params.bounds.contains(&self.best.position) {
            return Err("best solution lies outside the bounds".into());
        }
        if self.history.len() != self.iteration || !self.history.is_consistent() {
            return Err(format!(
                "history holds {} records for iteration {}",
                self.history.len(),
                self.iteration
            ));
        }
        if let Some(last) = self.history.last() {
            if last.best_cost != self.best.cost {
                return Err("history best cost disagrees with best solution".into());
            }
        }
        if self
            .population
            .bees()
            .iter()
            .any(|b| b.cost < self.best.cost)
        {
            return Err("a bee is better than the recorded best solution".into());
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    sequence: u64,
    iteration: usize,
    checksum: String,
    payload: String,
}

/// A stored checkpoint file. `sequence` orders records by save time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointEntry {
    pub sequence: u64,
    pub iteration: usize,
    pub path: PathBuf,
}

/// Directory of JSON checkpoint files with keep-newest-K retention.
pub struct CheckpointStore {
    dir: PathBuf,
    keep: usize,
}

impl CheckpointStore {
    pub fn open<P: AsRef<Path>>(dir: P, keep: usize) -> Result<Self, CheckpointError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            keep: keep.max(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Writes `record` atomically, then deletes the oldest records beyond the
    /// retention count.
    pub fn save(&self, record: &CheckpointRecord) -> Result<CheckpointEntry, CheckpointError> {
        let sequence = self
            .entries()?
            .last()
            .map(|e| e.sequence + 1)
            .unwrap_or(1);

        let payload = serde_json::to_string(record).map_err(|e| CheckpointError::Corrupt {
            path: self.dir.clone(),
            reason: format!("cannot serialize record: {}", e),
        })?;
        let envelope = Envelope {
            format_version: CHECKPOINT_FORMAT_VERSION,
            sequence,
            iteration: record.iteration,
            checksum: digest(&payload),
            payload,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|e| CheckpointError::Corrupt {
            path: self.dir.clone(),
            reason: format!("cannot serialize envelope: {}", e),
        })?;

        let path = self.dir.join(file_name(sequence, record.iteration));
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CheckpointError::Io(e.error))?;

        info!(
            "💾 Checkpoint #{} saved at iteration {} -> {}",
            sequence,
            record.iteration,
            path.display()
        );

        // The new record is already durable; a stale file left behind is not fatal.
        if let Err(e) = self.enforce_retention() {
            warn!("⚠️  Checkpoint retention failed: {}", e);
        }

        Ok(CheckpointEntry {
            sequence,
            iteration: record.iteration,
            path,
        })
    }

    /// Most recently saved record, or `None` if the store is empty.
    pub fn load_latest(&self) -> Result<Option<CheckpointRecord>, CheckpointError> {
        match self.entries()?.last() {
            Some(entry) => Ok(Some(read_record(entry)?)),
            None => Ok(None),
        }
    }

    /// Most recently saved record for `iteration`.
    pub fn load(&self, iteration: usize) -> Result<CheckpointRecord, CheckpointError> {
        let entry = self
            .entries()?
            .into_iter()
            .rev()
            .find(|e| e.iteration == iteration)
            .ok_or(CheckpointError::NotFound(iteration))?;
        read_record(&entry)
    }

    /// Stored records ordered oldest to newest. Files that do not follow the
    /// checkpoint naming scheme (including in-flight temp files) are ignored.
    pub fn entries(&self) -> Result<Vec<CheckpointEntry>, CheckpointError> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some((sequence, iteration)) = parse_file_name(name) {
                entries.push(CheckpointEntry {
                    sequence,
                    iteration,
                    path,
                });
            }
        }
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    fn enforce_retention(&self) -> Result<(), CheckpointError> {
        let entries = self.entries()?;
        if entries.len() <= self.keep {
            return Ok(());
        }
        let excess = entries.len() - self.keep;
        for entry in &entries[..excess] {
            fs::remove_file(&entry.path)?;
            debug!(
                "Retention removed checkpoint #{} (iteration {})",
                entry.sequence, entry.iteration
            );
        }
        Ok(())
    }
}

fn file_name(sequence: u64, iteration: usize) -> String {
    format!(
        "{}{:08}-iter{:06}{}",
        FILE_PREFIX, sequence, iteration, FILE_SUFFIX
    )
}

fn parse_file_name(name: &str) -> Option<(u64, usize)> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    let (sequence, iteration) = stem.split_once("-iter")?;
    Some((sequence.parse().ok()?, iteration.parse().ok()?))
}

fn digest(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

fn read_record(entry: &CheckpointEntry) -> Result<CheckpointRecord, CheckpointError> {
    let corrupt = |reason: String| CheckpointError::Corrupt {
        path: entry.path.clone(),
        reason,
    };

    let bytes = fs::read(&entry.path)?;
    let envelope: Envelope =
        serde_json::from_slice(&bytes).map_err(|e| corrupt(format!("bad envelope: {}", e)))?;

    if envelope.format_version != CHECKPOINT_FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {}",
            envelope.format_version
        )));
    }
    if envelope.checksum != digest(&envelope.payload) {
        return Err(corrupt("checksum mismatch".into()));
    }

    let record: CheckpointRecord = serde_json::from_str(&envelope.payload)
        .map_err(|e| corrupt(format!("bad payload: {}", e)))?;

    if record.iteration != envelope.iteration || record.iteration != entry.iteration {
        return Err(corrupt(format!(
            "iteration tag {} does not match record iteration {}",
            entry.iteration, record.iteration
        )));
    }
    record.check_consistency().map_err(corrupt)?;

    Ok(record)
}
