use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use crate::constants::{
    DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_COMPARISON_DAYS, DEFAULT_WORKERS,
};
use crate::stocks::StockRow;

/// Pause between two batches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BatchDelay {
    Fixed(Duration),
    /// Uniform in `[min, max]`.
    Jittered { min: Duration, max: Duration },
}

impl BatchDelay {
    pub fn next(&self) -> Duration {
        match *self {
            BatchDelay::Fixed(delay) => delay,
            BatchDelay::Jittered { min, max } if max > min => {
                rand::thread_rng().gen_range(min..=max)
            }
            BatchDelay::Jittered { min, .. } => min,
        }
    }
}

/// How a symbol list is split and fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOptions {
    /// Symbols per batch. Zero behaves as one.
    pub batch_size: usize,
    /// Concurrent fetches within a batch. Zero behaves as one.
    pub workers: usize,
    pub delay: BatchDelay,
    /// N for the N-day comparison.
    pub days: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            delay: BatchDelay::Fixed(Duration::from_millis(DEFAULT_BATCH_DELAY_MS)),
            days: DEFAULT_COMPARISON_DAYS,
        }
    }
}

/// A symbol that produced no row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedSymbol {
    pub symbol: String,
    pub reason: String,
    pub rate_limited: bool,
}

/// Result of a batched fetch.
///
/// `rows` is in completion order within each batch, batches in input order.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub rows: Vec<StockRow>,
    pub dropped: Vec<DroppedSymbol>,
    pub batches: usize,
}

impl BatchReport {
    pub fn dropped_symbols(&self) -> Vec<&str> {
        self.dropped.iter().map(|d| d.symbol.as_str()).collect()
    }
}
