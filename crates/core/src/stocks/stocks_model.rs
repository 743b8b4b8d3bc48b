//! Derived per-symbol figures and the composite table row.
//!
//! Nothing here rounds. Values keep full precision until rendering.

use aksmarket_market_data::{PriceBar, QuoteRecord};
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_INDUSTRY;

/// `(current - base) / base × 100`, absent when `base` is zero.
fn percent_change(current: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some((current - base) / base * 100.0)
    }
}

/// Valuation and price figures derived from one quote record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub pe: Option<f64>,
    pub eps: Option<f64>,
    pub market_cap: Option<f64>,
    pub sector: String,
    pub week_high: Option<f64>,
    pub week_low: Option<f64>,
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
}

impl Fundamentals {
    pub fn from_quote(quote: &QuoteRecord) -> Self {
        let pe = quote.pe();
        let last_price = quote.last_price();

        let eps = match (last_price, pe) {
            (Some(price), Some(pe)) if pe != 0.0 => Some(price / pe),
            _ => None,
        };
        let market_cap = match (quote.issued_shares(), last_price) {
            (Some(issued), Some(price)) => Some(issued * price),
            _ => None,
        };
        let (week_high, week_low) = quote.week_high_low();

        Self {
            pe,
            eps,
            market_cap,
            sector: quote.sector().unwrap_or(UNKNOWN_INDUSTRY).to_string(),
            week_high,
            week_low,
            last_price,
            previous_close: quote.previous_close(),
            open: quote.open(),
        }
    }
}

/// Average versus today's traded volume.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeStats {
    pub avg_volume: Option<f64>,
    pub todays_volume: Option<f64>,
    pub volume_change_pct: Option<f64>,
}

impl VolumeStats {
    pub fn new(avg_volume: Option<f64>, todays_volume: Option<f64>) -> Self {
        let volume_change_pct = match (avg_volume, todays_volume) {
            (Some(avg), Some(today)) => percent_change(today, avg),
            _ => None,
        };
        Self {
            avg_volume,
            todays_volume,
            volume_change_pct,
        }
    }

    /// Mean volume across `bars`, absent when there are none.
    pub fn average_volume(bars: &[PriceBar]) -> Option<f64> {
        if bars.is_empty() {
            return None;
        }
        let total: f64 = bars.iter().map(|b| b.volume).sum();
        Some(total / bars.len() as f64)
    }

    /// Total volume across one session of intraday bars.
    pub fn session_volume(bars: &[PriceBar]) -> Option<f64> {
        if bars.is_empty() {
            None
        } else {
            Some(bars.iter().map(|b| b.volume).sum())
        }
    }

    /// Volume of the most recent daily bar.
    pub fn last_bar_volume(bars: &[PriceBar]) -> Option<f64> {
        bars.last().map(|b| b.volume)
    }
}

/// Price now versus N trading days ago.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalComparison {
    pub past_price: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
}

impl HistoricalComparison {
    /// Compare the last close with the close `days` bars back.
    ///
    /// `closes` is oldest first. With fewer than two closes everything is
    /// absent; with fewer than `days` closes the oldest one is used.
    pub fn from_closes(closes: &[f64], days: u32) -> Self {
        let len = closes.len();
        if len < 2 {
            return Self::default();
        }
        let Some(&current) = closes.last() else {
            return Self::default();
        };

        let days = days as usize;
        let past = if days > 0 && len >= days {
            closes[len - days]
        } else {
            closes[0]
        };

        Self {
            past_price: Some(past),
            change: Some(current - past),
            change_pct: percent_change(current, past),
        }
    }

    pub fn from_bars(bars: &[PriceBar], days: u32) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self::from_closes(&closes, days)
    }
}

/// One dashboard table row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub symbol: String,
    pub name: String,
    pub industry: String,
    pub last_close: Option<f64>,
    pub open: Option<f64>,
    pub current: Option<f64>,
    pub day_change: Option<f64>,
    pub day_change_pct: Option<f64>,
    pub past_price: Option<f64>,
    pub past_change: Option<f64>,
    pub past_change_pct: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe: Option<f64>,
    pub eps: Option<f64>,
    pub avg_volume: Option<f64>,
    pub todays_volume: Option<f64>,
    pub volume_change_pct: Option<f64>,
}

impl StockRow {
    pub fn compose(
        symbol: &str,
        fundamentals: Fundamentals,
        volume: VolumeStats,
        history: HistoricalComparison,
    ) -> Self {
        let (day_change, day_change_pct) =
            match (fundamentals.last_price, fundamentals.previous_close) {
                (Some(current), Some(previous)) => {
                    (Some(current - previous), percent_change(current, previous))
                }
                _ => (None, None),
            };

        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            industry: fundamentals.sector,
            last_close: fundamentals.previous_close,
            open: fundamentals.open,
            current: fundamentals.last_price,
            day_change,
            day_change_pct,
            past_price: history.past_price,
            past_change: history.change,
            past_change_pct: history.change_pct,
            week52_high: fundamentals.week_high,
            week52_low: fundamentals.week_low,
            market_cap: fundamentals.market_cap,
            pe: fundamentals.pe,
            eps: fundamentals.eps,
            avg_volume: volume.avg_volume,
            todays_volume: volume.todays_volume,
            volume_change_pct: volume.volume_change_pct,
        }
    }
}
