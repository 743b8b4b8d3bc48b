use std::sync::Arc;

use aksmarket_market_data::{
    FetchOutcome, HistoryProvider, HistoryWindow, MarketDataError, PriceBar, QuoteProvider,
    QuoteRecord, RateLimiter, RetryPolicy, Sleeper, TokioSleeper,
};
use async_trait::async_trait;
use chrono::Duration;
use log::{debug, warn};

use super::stocks_model::{Fundamentals, HistoricalComparison, StockRow, VolumeStats};
use super::stocks_traits::{MarketDataServiceTrait, RowSource};
use crate::cache::{Clock, SystemClock, TtlCache};
use crate::constants::*;
use crate::errors::{outcome_into_result, Error, Result};

/// Retry and cache settings for [`MarketDataService`].
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub quote_retry: RetryPolicy,
    pub volume_retry: RetryPolicy,
    pub history_retry: RetryPolicy,
    pub quote_ttl: Duration,
    pub volume_ttl: Duration,
    pub history_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            quote_retry: RetryPolicy::exponential(3, std::time::Duration::from_secs(2)),
            volume_retry: RetryPolicy::exponential(3, std::time::Duration::from_millis(500)),
            history_retry: RetryPolicy::exponential(3, std::time::Duration::from_secs(1)),
            quote_ttl: Duration::minutes(QUOTE_TTL_MINUTES),
            volume_ttl: Duration::minutes(VOLUME_TTL_MINUTES),
            history_ttl: Duration::minutes(HISTORY_TTL_MINUTES),
        }
    }
}

/// Per-symbol accessors with their own caches.
///
/// Every provider call takes a token from the shared [`RateLimiter`] and runs
/// under a [`RetryPolicy`]. Only successful results are cached.
pub struct MarketDataService {
    quote_provider: Arc<dyn QuoteProvider>,
    history_provider: Arc<dyn HistoryProvider>,
    rate_limiter: Arc<RateLimiter>,
    sleeper: Arc<dyn Sleeper>,
    config: ServiceConfig,
    quotes: TtlCache<String, QuoteRecord>,
    fundamentals: TtlCache<String, Fundamentals>,
    volumes: TtlCache<String, VolumeStats>,
    histories: TtlCache<(String, u32), HistoricalComparison>,
}

impl MarketDataService {
    pub fn new(
        quote_provider: Arc<dyn QuoteProvider>,
        history_provider: Arc<dyn HistoryProvider>,
        config: ServiceConfig,
    ) -> Self {
        Self::with_runtime(
            quote_provider,
            history_provider,
            config,
            Arc::new(SystemClock),
            Arc::new(TokioSleeper),
            Arc::new(RateLimiter::new()),
        )
    }

    /// Build with an explicit clock, sleeper and rate limiter.
    pub fn with_runtime(
        quote_provider: Arc<dyn QuoteProvider>,
        history_provider: Arc<dyn HistoryProvider>,
        config: ServiceConfig,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        rate_limiter.configure(quote_provider.id(), quote_provider.rate_limit());
        rate_limiter.configure(history_provider.id(), history_provider.rate_limit());

        Self {
            quotes: TtlCache::with_clock("quote", config.quote_ttl, clock.clone()),
            fundamentals: TtlCache::with_clock("fundamentals", config.quote_ttl, clock.clone()),
            volumes: TtlCache::with_clock("volume", config.volume_ttl, clock.clone()),
            histories: TtlCache::with_clock("history", config.history_ttl, clock),
            quote_provider,
            history_provider,
            rate_limiter,
            sleeper,
            config,
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> FetchOutcome<QuoteRecord> {
        let provider = self.quote_provider.as_ref();
        let limiter = self.rate_limiter.as_ref();
        self.config
            .quote_retry
            .run(self.sleeper.as_ref(), symbol, move || async move {
                limiter.acquire(provider.id()).await;
                provider.get_quote(symbol).await
            })
            .await
    }

    async fn fetch_bars(
        &self,
        policy: &RetryPolicy,
        symbol: &str,
        window: HistoryWindow,
    ) -> FetchOutcome<Vec<PriceBar>> {
        let provider = self.history_provider.as_ref();
        let limiter = self.rate_limiter.as_ref();
        policy
            .run(self.sleeper.as_ref(), symbol, move || async move {
                limiter.acquire(provider.id()).await;
                provider.get_history(symbol, window).await
            })
            .await
    }

    /// Today's volume: intraday sum first, then the last daily bar.
    async fn fetch_todays_volume(&self, symbol: &str) -> Result<f64> {
        let policy = &self.config.volume_retry;

        match self
            .fetch_bars(policy, symbol, HistoryWindow::intraday(1))
            .await
        {
            FetchOutcome::Fetched(bars) => {
                if let Some(volume) = VolumeStats::session_volume(&bars) {
                    return Ok(volume);
                }
            }
            other => {
                if let Some(e) = other.error() {
                    debug!("Intraday volume unavailable for {}: {}", symbol, e);
                }
            }
        }

        let bars = outcome_into_result(
            symbol,
            self.fetch_bars(policy, symbol, HistoryWindow::daily(1)).await,
        )?;
        VolumeStats::last_bar_volume(&bars)
            .ok_or(Error::MarketData(MarketDataError::NoDataForRange))
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord> {
        let key = symbol.to_string();
        if let Some(quote) = self.quotes.get(&key) {
            return Ok(quote);
        }

        let quote = outcome_into_result(symbol, self.fetch_quote(symbol).await)?;
        self.quotes.insert(key, quote.clone());
        Ok(quote)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let key = symbol.to_string();
        if let Some(fundamentals) = self.fundamentals.get(&key) {
            return Ok(fundamentals);
        }

        let quote = self.quote(symbol).await?;
        let fundamentals = Fundamentals::from_quote(&quote);
        self.fundamentals.insert(key, fundamentals.clone());
        Ok(fundamentals)
    }

    async fn volume_stats(&self, symbol: &str) -> Result<VolumeStats> {
        let key = symbol.to_string();
        if let Some(stats) = self.volumes.get(&key) {
            return Ok(stats);
        }

        let average = outcome_into_result(
            symbol,
            self.fetch_bars(
                &self.config.volume_retry,
                symbol,
                HistoryWindow::daily(VOLUME_AVERAGE_DAYS),
            )
            .await,
        );
        let today = self.fetch_todays_volume(symbol).await;

        let stats = match (average, today) {
            (Err(e), Err(_)) => {
                warn!("Volume stats unavailable for {}: {}", symbol, e);
                return Err(e);
            }
            (average, today) => VolumeStats::new(
                average.ok().and_then(|bars| VolumeStats::average_volume(&bars)),
                today.ok(),
            ),
        };

        self.volumes.insert(key, stats.clone());
        Ok(stats)
    }

    async fn historical_comparison(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<HistoricalComparison> {
        let key = (symbol.to_string(), days);
        if let Some(comparison) = self.histories.get(&key) {
            return Ok(comparison);
        }

        let window = HistoryWindow::daily(days.saturating_add(HISTORY_PADDING_DAYS));
        let bars = outcome_into_result(
            symbol,
            self.fetch_bars(&self.config.history_retry, symbol, window).await,
        )?;

        let comparison = HistoricalComparison::from_bars(&bars, days);
        self.histories.insert(key, comparison.clone());
        Ok(comparison)
    }

    async fn row(&self, symbol: &str, days: u32) -> Result<StockRow> {
        let fundamentals = self.fundamentals(symbol).await?;

        let (volume, history) = futures::join!(
            self.volume_stats(symbol),
            self.historical_comparison(symbol, days)
        );
        let history = history.unwrap_or_else(|e| {
            warn!("Historical data error for {}: {}", symbol, e);
            HistoricalComparison::default()
        });

        Ok(StockRow::compose(
            symbol,
            fundamentals,
            volume.unwrap_or_default(),
            history,
        ))
    }

    fn clear_caches(&self) {
        self.quotes.clear();
        self.fundamentals.clear();
        self.volumes.clear();
        self.histories.clear();
    }
}

#[async_trait]
impl RowSource for MarketDataService {
    async fn fetch_row(&self, symbol: &str, days: u32) -> Result<StockRow> {
        self.row(symbol, days).await
    }
}
