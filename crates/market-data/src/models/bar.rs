use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bar granularity requested from the history provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// One-minute intraday bars
    OneMinute,
    /// Daily bars
    OneDay,
}

impl Interval {
    /// Interval string understood by the Yahoo chart API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::OneDay => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lookback window: the last `days` calendar days at `interval` granularity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HistoryWindow {
    pub days: u32,
    pub interval: Interval,
}

impl HistoryWindow {
    pub fn daily(days: u32) -> Self {
        Self {
            days,
            interval: Interval::OneDay,
        }
    }

    pub fn intraday(days: u32) -> Self {
        Self {
            days,
            interval: Interval::OneMinute,
        }
    }
}

/// One OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar with only a close and volume, as used by tests and fallbacks.
    pub fn close_volume(timestamp: DateTime<Utc>, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }
}
