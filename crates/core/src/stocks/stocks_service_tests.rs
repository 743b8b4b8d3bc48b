//! Tests for MarketDataService caching, fallbacks and degradation.

#[cfg(test)]
mod tests {
    use crate::cache::ManualClock;
    use crate::errors::Error;
    use crate::stocks::{MarketDataService, MarketDataServiceTrait, ServiceConfig};
    use aksmarket_market_data::{
        HistoryProvider, HistoryWindow, Interval, MarketDataError, PriceBar, QuoteProvider,
        QuoteRecord, RateLimit, RateLimiter, Sleeper,
    };
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    fn fast_limit() -> RateLimit {
        RateLimit {
            requests_per_minute: 60_000,
            burst_capacity: 1_000.0,
        }
    }

    // =========================================================================
    // Mock providers
    // =========================================================================

    #[derive(Default)]
    struct MockQuoteProvider {
        quotes: Mutex<HashMap<String, QuoteRecord>>,
        failures: Mutex<HashMap<String, VecDeque<MarketDataError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockQuoteProvider {
        fn with_quote(self, symbol: &str, record: serde_json::Value) -> Self {
            self.quotes
                .lock()
                .unwrap()
                .insert(symbol.to_string(), serde_json::from_value(record).unwrap());
            self
        }

        fn fail_next(&self, symbol: &str, error: MarketDataError) {
            self.failures
                .lock()
                .unwrap()
                .entry(symbol.to_string())
                .or_default()
                .push_back(error);
        }

        fn call_count(&self, symbol: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.as_str() == symbol)
                .count()
        }
    }

    #[async_trait]
    impl QuoteProvider for MockQuoteProvider {
        fn id(&self) -> &'static str {
            "MOCK_QUOTE"
        }

        fn rate_limit(&self) -> RateLimit {
            fast_limit()
        }

        async fn get_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if let Some(error) = self
                .failures
                .lock()
                .unwrap()
                .get_mut(symbol)
                .and_then(|q| q.pop_front())
            {
                return Err(error);
            }
            self.quotes
                .lock()
                .unwrap()
                .get(symbol)
                .cloned()
                .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
        }
    }

    #[derive(Default)]
    struct MockHistoryProvider {
        daily: Mutex<Vec<PriceBar>>,
        intraday: Mutex<Vec<PriceBar>>,
        windows: Mutex<Vec<HistoryWindow>>,
        unavailable: Mutex<bool>,
    }

    impl MockHistoryProvider {
        fn with_daily(self, closes_and_volumes: &[(f64, f64)]) -> Self {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
            *self.daily.lock().unwrap() = closes_and_volumes
                .iter()
                .enumerate()
                .map(|(i, (c, v))| PriceBar::close_volume(start + Duration::days(i as i64), *c, *v))
                .collect();
            self
        }

        fn with_intraday(self, volumes: &[f64]) -> Self {
            let start = Utc.with_ymd_and_hms(2024, 2, 1, 9, 15, 0).unwrap();
            *self.intraday.lock().unwrap() = volumes
                .iter()
                .enumerate()
                .map(|(i, v)| PriceBar::close_volume(start + Duration::minutes(i as i64), 1.0, *v))
                .collect();
            self
        }

        fn windows(&self) -> Vec<HistoryWindow> {
            self.windows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HistoryProvider for MockHistoryProvider {
        fn id(&self) -> &'static str {
            "MOCK_HISTORY"
        }

        fn rate_limit(&self) -> RateLimit {
            fast_limit()
        }

        async fn get_history(
            &self,
            _symbol: &str,
            window: HistoryWindow,
        ) -> Result<Vec<PriceBar>, MarketDataError> {
            self.windows.lock().unwrap().push(window);
            if *self.unavailable.lock().unwrap() {
                return Err(MarketDataError::NoDataForRange);
            }
            let bars = match window.interval {
                Interval::OneMinute => self.intraday.lock().unwrap().clone(),
                Interval::OneDay => {
                    let daily = self.daily.lock().unwrap();
                    let keep = (window.days as usize).min(daily.len());
                    daily[daily.len() - keep..].to_vec()
                }
            };
            if bars.is_empty() {
                Err(MarketDataError::NoDataForRange)
            } else {
                Ok(bars)
            }
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<std::time::Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: std::time::Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    struct Harness {
        service: MarketDataService,
        quotes: Arc<MockQuoteProvider>,
        history: Arc<MockHistoryProvider>,
        clock: Arc<ManualClock>,
        sleeper: Arc<RecordingSleeper>,
    }

    fn harness(quotes: MockQuoteProvider, history: MockHistoryProvider) -> Harness {
        let quotes = Arc::new(quotes);
        let history = Arc::new(history);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        ));
        let sleeper = Arc::new(RecordingSleeper::default());
        let service = MarketDataService::with_runtime(
            quotes.clone(),
            history.clone(),
            ServiceConfig::default(),
            clock.clone(),
            sleeper.clone(),
            Arc::new(RateLimiter::new()),
        );
        Harness {
            service,
            quotes,
            history,
            clock,
            sleeper,
        }
    }

    fn tcs_quote() -> serde_json::Value {
        json!({
            "metadata": {"pdSymbolPe": 30.0},
            "securityInfo": {"issuedSize": 1000},
            "priceInfo": {"lastPrice": 150.0, "previousClose": 120.0, "open": 125.0},
            "industryInfo": {"industry": "IT - Software"}
        })
    }

    // =========================================================================
    // Caching
    // =========================================================================

    #[tokio::test]
    async fn test_quote_is_served_from_cache() {
        let h = harness(
            MockQuoteProvider::default().with_quote("TCS", tcs_quote()),
            MockHistoryProvider::default(),
        );

        h.service.quote("TCS").await.unwrap();
        h.service.fundamentals("TCS").await.unwrap();
        h.service.quote("TCS").await.unwrap();

        assert_eq!(h.quotes.call_count("TCS"), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let h = harness(
            MockQuoteProvider::default().with_quote("TCS", tcs_quote()),
            MockHistoryProvider::default(),
        );
        h.quotes.fail_next("TCS", MarketDataError::NoDataForRange);

        assert!(h.service.quote("TCS").await.is_err());
        assert!(h.service.quote("TCS").await.is_ok());
        assert_eq!(h.quotes.call_count("TCS"), 2);
    }

    #[tokio::test]
    async fn test_quote_expires_after_ttl() {
        let h = harness(
            MockQuoteProvider::default().with_quote("TCS", tcs_quote()),
            MockHistoryProvider::default(),
        );

        h.service.quote("TCS").await.unwrap();
        h.clock.advance(Duration::minutes(29));
        h.service.quote("TCS").await.unwrap();
        assert_eq!(h.quotes.call_count("TCS"), 1);

        h.clock.advance(Duration::minutes(2));
        h.service.quote("TCS").await.unwrap();
        assert_eq!(h.quotes.call_count("TCS"), 2);
    }

    #[tokio::test]
    async fn test_clear_caches_forces_refetch() {
        let h = harness(
            MockQuoteProvider::default().with_quote("TCS", tcs_quote()),
            MockHistoryProvider::default().with_daily(&[(100.0, 10.0), (110.0, 20.0)]),
        );

        h.service.fundamentals("TCS").await.unwrap();
        h.service.historical_comparison("TCS", 1).await.unwrap();
        h.service.clear_caches();
        h.service.fundamentals("TCS").await.unwrap();
        h.service.historical_comparison("TCS", 1).await.unwrap();

        assert_eq!(h.quotes.call_count("TCS"), 2);
        assert_eq!(h.history.windows().len(), 2);
    }

    #[tokio::test]
    async fn test_history_cache_is_keyed_by_days() {
        let h = harness(
            MockQuoteProvider::default(),
            MockHistoryProvider::default().with_daily(&[(100.0, 1.0), (105.0, 1.0), (110.0, 1.0)]),
        );

        h.service.historical_comparison("TCS", 2).await.unwrap();
        h.service.historical_comparison("TCS", 2).await.unwrap();
        h.service.historical_comparison("TCS", 50).await.unwrap();

        assert_eq!(
            h.history.windows(),
            vec![HistoryWindow::daily(12), HistoryWindow::daily(60)]
        );
    }

    // =========================================================================
    // Retry behaviour
    // =========================================================================

    #[tokio::test]
    async fn test_rate_limited_quote_is_retried() {
        let h = harness(
            MockQuoteProvider::default().with_quote("TCS", tcs_quote()),
            MockHistoryProvider::default(),
        );
        h.quotes.fail_next(
            "TCS",
            MarketDataError::RateLimited {
                provider: "MOCK_QUOTE".to_string(),
            },
        );

        let quote = h.service.quote("TCS").await.unwrap();
        assert_eq!(quote.last_price(), Some(150.0));
        assert_eq!(
            *h.sleeper.delays.lock().unwrap(),
            vec![std::time::Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_exhausted_quote_reports_symbol() {
        let h = harness(MockQuoteProvider::default(), MockHistoryProvider::default());
        for _ in 0..3 {
            h.quotes.fail_next(
                "INFY",
                MarketDataError::RateLimited {
                    provider: "MOCK_QUOTE".to_string(),
                },
            );
        }

        let err = h.service.quote("INFY").await.unwrap_err();
        assert!(matches!(err, Error::Exhausted { ref symbol, attempts: 3, .. } if symbol == "INFY"));
        assert_eq!(h.sleeper.delays.lock().unwrap().len(), 2);
    }

    // =========================================================================
    // Volume stats
    // =========================================================================

    #[tokio::test]
    async fn test_volume_prefers_intraday_sum() {
        let h = harness(
            MockQuoteProvider::default(),
            MockHistoryProvider::default()
                .with_daily(&[(1.0, 100.0), (1.0, 300.0)])
                .with_intraday(&[50.0, 150.0, 100.0]),
        );

        let stats = h.service.volume_stats("TCS").await.unwrap();
        assert_eq!(stats.avg_volume, Some(200.0));
        assert_eq!(stats.todays_volume, Some(300.0));
        assert_eq!(stats.volume_change_pct, Some(50.0));
    }

    #[tokio::test]
    async fn test_volume_falls_back_to_last_daily_bar() {
        let h = harness(
            MockQuoteProvider::default(),
            MockHistoryProvider::default().with_daily(&[(1.0, 100.0), (1.0, 300.0)]),
        );

        let stats = h.service.volume_stats("TCS").await.unwrap();
        assert_eq!(stats.todays_volume, Some(300.0));
        assert_eq!(
            h.history.windows(),
            vec![
                HistoryWindow::daily(30),
                HistoryWindow::intraday(1),
                HistoryWindow::daily(1)
            ]
        );
    }

    #[tokio::test]
    async fn test_volume_fails_when_every_call_fails() {
        let history = MockHistoryProvider::default();
        *history.unavailable.lock().unwrap() = true;
        let h = harness(MockQuoteProvider::default(), history);

        assert!(h.service.volume_stats("TCS").await.is_err());
    }

    // =========================================================================
    // Rows
    // =========================================================================

    #[tokio::test]
    async fn test_row_degrades_volume_and_history_to_absent() {
        let history = MockHistoryProvider::default();
        *history.unavailable.lock().unwrap() = true;
        let h = harness(
            MockQuoteProvider::default().with_quote("TCS", tcs_quote()),
            history,
        );

        let row = h.service.row("TCS", 10).await.unwrap();
        assert_eq!(row.current, Some(150.0));
        assert_eq!(row.day_change, Some(30.0));
        assert_eq!(row.day_change_pct, Some(25.0));
        assert_eq!(row.market_cap, Some(150_000.0));
        assert_eq!(row.eps, Some(5.0));
        assert_eq!(row.industry, "IT - Software");
        assert_eq!(row.avg_volume, None);
        assert_eq!(row.past_price, None);
    }

    #[tokio::test]
    async fn test_row_fails_without_fundamentals() {
        let h = harness(
            MockQuoteProvider::default(),
            MockHistoryProvider::default().with_daily(&[(1.0, 1.0), (2.0, 1.0)]),
        );

        let err = h.service.row("MISSING", 10).await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::SymbolNotFound(_))
        ));
        assert!(h.history.windows().is_empty());
    }
}
