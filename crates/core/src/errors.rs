//! Core error types for the AKS market dashboard.

use std::path::PathBuf;

use aksmarket_market_data::{FetchOutcome, MarketDataError};
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the dashboard core.
///
/// None of these reach the rendered table: accessors turn them into absent
/// fields and the batch orchestrator into dropped symbols.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Gave up on {symbol} after {attempts} attempts: {last_error}")]
    Exhausted {
        symbol: String,
        attempts: u32,
        last_error: MarketDataError,
    },

    #[error("Symbol file not found: {}", .0.display())]
    UniverseNotFound(PathBuf),

    #[error("Column '{column}' missing from {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the failure came from provider throttling rather than bad data.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Error::Exhausted { .. } => true,
            Error::MarketData(e) => e.is_rate_limited(),
            _ => false,
        }
    }
}

/// Turn a retried fetch into a `Result`, tagging exhaustion with the symbol.
pub(crate) fn outcome_into_result<T>(symbol: &str, outcome: FetchOutcome<T>) -> Result<T> {
    match outcome {
        FetchOutcome::Fetched(value) => Ok(value),
        FetchOutcome::Failed(error) => Err(Error::MarketData(error)),
        FetchOutcome::Exhausted {
            attempts,
            last_error,
        } => Err(Error::Exhausted {
            symbol: symbol.to_string(),
            attempts,
            last_error,
        }),
    }
}
