//! AKS Market Core - caches, derived figures and batch orchestration.
//!
//! This crate sits between the providers in `aksmarket-market-data` and the
//! presentation layer. It owns the per-symbol caches, derives fundamentals,
//! volume and N-day comparisons, composes table rows, fetches them in paced
//! batches, and loads the symbol universe.

pub mod batch;
pub mod cache;
pub mod constants;
pub mod errors;
pub mod sort;
pub mod stocks;
pub mod universe;

// Re-export the main entry points
pub use batch::{fetch_rows, BatchDelay, BatchOptions, BatchReport, DroppedSymbol};
pub use sort::{sort_rows, SortColumn, SortDirection, SortState};
pub use stocks::{
    Fundamentals, HistoricalComparison, MarketDataService, MarketDataServiceTrait, RowSource,
    ServiceConfig, StockRow, VolumeStats,
};
pub use universe::{IndustryFilter, SymbolUniverse};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
