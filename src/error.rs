use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Malformed sampling or selection input. These are programming errors and
/// are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("cannot draw a partner from a population of {0} (need at least 2)")]
    PopulationTooSmall(usize),

    #[error("index {index} is out of range for {len} slots")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("roulette wheel needs at least one weight")]
    EmptyWeights,

    #[error("roulette weights sum to zero")]
    ZeroWeights,

    #[error("weight {value} at index {index} is negative or not finite")]
    InvalidWeight { index: usize, value: f64 },

    #[error("expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
}

/// Failure reported by an external objective evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ObjectiveFailure(pub String);

impl ObjectiveFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A batch evaluation failed. `index` is the position of the failing unit in
/// the batch that was submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("objective failed at batch index {index}: {source}")]
    Failed {
        index: usize,
        #[source]
        source: ObjectiveFailure,
    },

    #[error("objective at batch index {index} exceeded its {limit:?} deadline")]
    TimedOut { index: usize, limit: Duration },

    #[error("objective returned non-finite cost {cost} at batch index {index}")]
    NonFiniteCost { index: usize, cost: f64 },
}

impl EvaluationError {
    pub fn index(&self) -> usize {
        match self {
            Self::Failed { index, .. }
            | Self::TimedOut { index, .. }
            | Self::NonFiniteCost { index, .. } => *index,
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("no checkpoint recorded for iteration {0}")]
    NotFound(usize),

    #[error("checkpoint '{}' is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("checkpoint does not match the run configuration: {0}")]
    Incompatible(String),

    #[error("checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum HiveError {
    #[error("Domain Error: {0}")]
    Domain(#[from] DomainError),

    #[error("Evaluation Error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Checkpoint Error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

pub type HiveResult<T> = Result<T, HiveError>;
