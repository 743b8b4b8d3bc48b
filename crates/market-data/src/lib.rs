//! AKS Market Data Crate
//!
//! Provider-facing half of the dashboard: talks to the exchange-quote
//! endpoint and the historical-price provider, and supplies the retry and pacing
//! plumbing every call goes through.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +------------------+
//! |   RetryPolicy    | --> |   RateLimiter    |  (shared token bucket)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!          +-----------------------+-----------------------+
//!          |                                               |
//!  +------------------+                           +------------------+
//!  |  QuoteProvider   |  (NSE quote-equity)       | HistoryProvider  |  (Yahoo chart)
//!  +------------------+                           +------------------+
//!          |                                               |
//!          v                                               v
//!  +------------------+                           +------------------+
//!  |   QuoteRecord    |                           |    PriceBar      |
//!  +------------------+                           +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`QuoteRecord`] - Raw exchange quote with its four sections
//! - [`PriceBar`] - One OHLCV bar from the history provider
//! - [`FetchOutcome`] - Result of a retried fetch (fetched / failed / exhausted)
//! - [`MarketDataError`] - Error taxonomy with retry classification

pub mod coerce;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resilience;

pub use coerce::{coerce_f64, first_truthy, parse_f64};
pub use errors::{MarketDataError, RetryClass};
pub use models::{HistoryWindow, Interval, PriceBar, QuoteRecord};
pub use provider::nse::NseProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{HistoryProvider, QuoteProvider, RateLimit};
pub use resilience::{
    Backoff, FetchOutcome, RateLimiter, RetryOn, RetryPolicy, Sleeper, TokioSleeper,
};
