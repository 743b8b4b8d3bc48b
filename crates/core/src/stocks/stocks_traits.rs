use aksmarket_market_data::QuoteRecord;
use async_trait::async_trait;

use super::stocks_model::{Fundamentals, HistoricalComparison, StockRow, VolumeStats};
use crate::errors::Result;

/// Anything that can produce a table row for a symbol.
///
/// The batch orchestrator only needs this; tests drive it with scripted rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_row(&self, symbol: &str, days: u32) -> Result<StockRow>;
}

/// Memoized per-symbol accessors over the quote and history providers.
#[async_trait]
pub trait MarketDataServiceTrait: RowSource {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord>;
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals>;
    async fn volume_stats(&self, symbol: &str) -> Result<VolumeStats>;
    async fn historical_comparison(&self, symbol: &str, days: u32)
        -> Result<HistoricalComparison>;
    /// Compose a row. Fails only when fundamentals are unavailable.
    async fn row(&self, symbol: &str, days: u32) -> Result<StockRow>;
    /// Empty every cache.
    fn clear_caches(&self);
}
