pub mod export;
pub mod tables;

pub use export::write_history_csv;
pub use tables::{best_table, checkpoint_table, history_table};
