//! Market data models
//!
//! - `quote` - Raw exchange quote record (QuoteRecord)
//! - `bar` - Price history bars and the windows they are requested for (PriceBar, Interval, HistoryWindow)

mod bar;
mod quote;

pub use bar::{HistoryWindow, Interval, PriceBar};
pub use quote::QuoteRecord;
