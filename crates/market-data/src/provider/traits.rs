//! Provider trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, PriceBar, QuoteRecord};

/// Pacing configuration for a provider.
///
/// Fed into the shared token-bucket [`RateLimiter`](crate::RateLimiter).
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimit {
    /// Sustained requests allowed per minute.
    pub requests_per_minute: u32,

    /// Requests that may be issued back to back before pacing starts.
    pub burst_capacity: f64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst_capacity: 10.0,
        }
    }
}

/// Source of full quote records for a symbol.
///
/// Implement this trait to plug in a different exchange-quote endpoint.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier, e.g. "NSE". Used for logging and rate-limit buckets.
    fn id(&self) -> &'static str;

    /// Pacing configuration for this provider.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Fetch the current quote record for `symbol` (bare ticker, no exchange prefix).
    async fn get_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError>;
}

/// Source of price and volume history for a symbol.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Unique identifier, e.g. "YAHOO".
    fn id(&self) -> &'static str;

    /// Pacing configuration for this provider.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Fetch bars covering `window`, ordered by timestamp ascending.
    ///
    /// Returns [`MarketDataError::NoDataForRange`] rather than an empty vector.
    async fn get_history(
        &self,
        symbol: &str,
        window: HistoryWindow,
    ) -> Result<Vec<PriceBar>, MarketDataError>;
}
