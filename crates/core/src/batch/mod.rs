//! Batched, bounded-concurrency row fetching.

mod batch_model;
mod batch_runner;

pub use batch_model::{BatchDelay, BatchOptions, BatchReport, DroppedSymbol};
pub use batch_runner::fetch_rows;
