//! Yahoo Finance price-history provider.
//!
//! Serves daily and one-minute bars for exchange-listed equities. Bare NSE
//! tickers are mapped to Yahoo symbols by appending the exchange suffix
//! (`TCS` -> `TCS.NS`).

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{HistoryWindow, PriceBar};
use crate::provider::{HistoryProvider, RateLimit};

const PROVIDER_ID: &str = "YAHOO";

/// Suffix Yahoo uses for National Stock Exchange of India listings.
pub const NSE_SUFFIX: &str = ".NS";

/// Yahoo Finance history provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    suffix: String,
}

impl YahooProvider {
    /// Create a provider for NSE listings.
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_suffix(NSE_SUFFIX)
    }

    /// Create a provider that appends `suffix` to every ticker.
    pub fn with_suffix(suffix: impl Into<String>) -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        Ok(Self {
            connector,
            suffix: suffix.into(),
        })
    }

    /// Yahoo symbol for a bare ticker.
    fn yahoo_symbol(&self, symbol: &str) -> String {
        if self.suffix.is_empty() || symbol.ends_with(&self.suffix) {
            symbol.to_string()
        } else {
            format!("{}{}", symbol, self.suffix)
        }
    }

    /// Convert chrono DateTime<Utc> to time::OffsetDateTime for the Yahoo API.
    fn chrono_to_offset_datetime(dt: DateTime<Utc>) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(dt.timestamp())
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    /// Convert a Yahoo quote to a bar.
    fn yahoo_quote_to_bar(yahoo_quote: &yahoo::Quote) -> Option<PriceBar> {
        let timestamp = Utc
            .timestamp_opt(yahoo_quote.timestamp as i64, 0)
            .single()?;
        if !yahoo_quote.close.is_finite() {
            return None;
        }
        Some(PriceBar {
            timestamp,
            open: yahoo_quote.open,
            high: yahoo_quote.high,
            low: yahoo_quote.low,
            close: yahoo_quote.close,
            volume: yahoo_quote.volume as f64,
        })
    }

    fn map_error(symbol: &str, e: yahoo::YahooError) -> MarketDataError {
        match e {
            yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult => {
                MarketDataError::SymbolNotFound(symbol.to_string())
            }
            other => MarketDataError::from_provider_message(PROVIDER_ID, other.to_string()),
        }
    }
}

#[async_trait]
impl HistoryProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 120,
            burst_capacity: 10.0,
        }
    }

    async fn get_history(
        &self,
        symbol: &str,
        window: HistoryWindow,
    ) -> Result<Vec<PriceBar>, MarketDataError> {
        let ticker = self.yahoo_symbol(symbol);
        let end = Utc::now();
        let start = end - Duration::days(i64::from(window.days.max(1)));

        debug!(
            "Fetching {} bars for {} from {} to {} from Yahoo",
            window.interval,
            ticker,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let response = self
            .connector
            .get_quote_history_interval(
                &ticker,
                Self::chrono_to_offset_datetime(start),
                Self::chrono_to_offset_datetime(end),
                window.interval.as_str(),
            )
            .await
            .map_err(|e| Self::map_error(&ticker, e))?;

        match response.quotes() {
            Ok(yahoo_quotes) => {
                let bars: Vec<PriceBar> = yahoo_quotes
                    .iter()
                    .filter_map(|q| {
                        let bar = Self::yahoo_quote_to_bar(q);
                        if bar.is_none() {
                            warn!("Skipping malformed {} bar for {}", window.interval, ticker);
                        }
                        bar
                    })
                    .collect();

                if bars.is_empty() {
                    return Err(MarketDataError::NoDataForRange);
                }
                Ok(bars)
            }
            Err(yahoo::YahooError::NoQuotes) => {
                warn!(
                    "No {} bars returned for '{}' over the last {} days",
                    window.interval, ticker, window.days
                );
                Err(MarketDataError::NoDataForRange)
            }
            Err(e) => Err(Self::map_error(&ticker, e)),
        }
    }
}
