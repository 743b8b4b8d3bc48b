//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The [`QuoteProvider`] and [`HistoryProvider`] traits
//! - Rate limiting configuration per provider
//! - Concrete providers: NSE (exchange quotes) and Yahoo (price history)
//!
//! Providers do no retrying or pacing of their own. They surface failures as
//! [`MarketDataError`](crate::MarketDataError) values and leave backoff to
//! [`RetryPolicy`](crate::RetryPolicy) and pacing to
//! [`RateLimiter`](crate::RateLimiter).

mod traits;

pub mod nse;
pub mod yahoo;

pub use traits::{HistoryProvider, QuoteProvider, RateLimit};
