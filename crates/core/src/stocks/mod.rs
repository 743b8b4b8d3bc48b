//! Per-symbol market figures: derivation, accessors and rows.

mod stocks_model;
mod stocks_service;
mod stocks_traits;

#[cfg(test)]
mod stocks_service_tests;

pub use stocks_model::{Fundamentals, HistoricalComparison, StockRow, VolumeStats};
pub use stocks_service::{MarketDataService, ServiceConfig};
pub use stocks_traits::{MarketDataServiceTrait, RowSource};
