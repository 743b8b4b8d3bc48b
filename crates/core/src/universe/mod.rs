//! The symbol universe and the job that builds it.

mod enrich;
mod universe_loader;
mod universe_model;

pub use enrich::{EnrichOptions, EnrichmentSummary, IndustryEnricher};
pub use universe_loader::{load_tickers, strip_exchange_prefix};
pub use universe_model::{IndustryFilter, SymbolUniverse, UniverseEntry};
