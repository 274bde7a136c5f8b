pub mod checkpoint;
pub mod config;
pub mod error;
pub mod objectives;
pub mod optimizer;

pub use error::{
    CheckpointError, DomainError, EvaluationError, HiveError, HiveResult, ObjectiveFailure,
};
