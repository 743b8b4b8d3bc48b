//! Builds the enriched symbol file from a raw ticker list.
//!
//! One quote request per symbol, paced by the shared rate limiter plus a
//! cooldown every few symbols. Any failure is retried with linear backoff and
//! finally recorded as `"N/A"` so the output always covers every input symbol.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aksmarket_market_data::{QuoteProvider, RateLimiter, RetryPolicy, Sleeper};
use log::{debug, info, warn};
use serde::Serialize;

use super::universe_loader::load_tickers;
use super::universe_model::UniverseEntry;
use crate::constants::UNKNOWN_INDUSTRY;
use crate::errors::Result;

/// Settings for [`IndustryEnricher`].
#[derive(Clone, Debug)]
pub struct EnrichOptions {
    pub retry: RetryPolicy,
    /// Pause after this many symbols. Zero disables the cooldown.
    pub cooldown_every: usize,
    pub cooldown: Duration,
    /// Prefix written in the `ticker` column, e.g. `NSE`.
    pub exchange: String,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::linear_any_error(3, Duration::from_secs(1)),
            cooldown_every: 10,
            cooldown: Duration::from_secs(2),
            exchange: "NSE".to_string(),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    pub total: usize,
    pub fetched: usize,
    pub unknown: usize,
    /// `(industry, count)`, most common first.
    pub distribution: Vec<(String, usize)>,
}

impl EnrichmentSummary {
    pub fn from_entries(entries: &[UniverseEntry]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in entries {
            *counts.entry(entry.industry.as_str()).or_default() += 1;
        }
        let unknown = counts.get(UNKNOWN_INDUSTRY).copied().unwrap_or(0);

        let mut distribution: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(industry, count)| (industry.to_string(), count))
            .collect();
        distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            total: entries.len(),
            fetched: entries.len() - unknown,
            unknown,
            distribution,
        }
    }
}

impl fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total symbols processed: {}", self.total)?;
        writeln!(f, "Successfully fetched: {}", self.fetched)?;
        writeln!(f, "Failed/Unknown: {}", self.unknown)?;
        writeln!(f)?;
        writeln!(f, "Industry Distribution:")?;
        for (industry, count) in &self.distribution {
            writeln!(f, "  {}: {}", industry, count)?;
        }
        Ok(())
    }
}

/// Looks up the industry label of every symbol in a list.
pub struct IndustryEnricher {
    provider: Arc<dyn QuoteProvider>,
    rate_limiter: Arc<RateLimiter>,
    sleeper: Arc<dyn Sleeper>,
    options: EnrichOptions,
}

impl IndustryEnricher {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        rate_limiter: Arc<RateLimiter>,
        sleeper: Arc<dyn Sleeper>,
        options: EnrichOptions,
    ) -> Self {
        rate_limiter.configure(provider.id(), provider.rate_limit());
        Self {
            provider,
            rate_limiter,
            sleeper,
            options,
        }
    }

    /// Industry label for one symbol, `"N/A"` when it can't be determined.
    pub async fn industry_for(&self, symbol: &str) -> String {
        let provider = self.provider.as_ref();
        let limiter = self.rate_limiter.as_ref();
        let outcome = self
            .options
            .retry
            .run(self.sleeper.as_ref(), symbol, move || async move {
                limiter.acquire(provider.id()).await;
                provider.get_quote(symbol).await
            })
            .await;

        match outcome.ok() {
            Some(quote) => quote
                .industry_label()
                .unwrap_or(UNKNOWN_INDUSTRY)
                .to_string(),
            None => UNKNOWN_INDUSTRY.to_string(),
        }
    }

    /// Label every symbol, in input order.
    pub async fn enrich(&self, symbols: &[String]) -> Vec<UniverseEntry> {
        let total = symbols.len();
        let mut entries = Vec::with_capacity(total);

        for (i, symbol) in symbols.iter().enumerate() {
            let industry = self.industry_for(symbol).await;
            debug!("[{}/{}] {} -> {}", i + 1, total, symbol, industry);
            if industry == UNKNOWN_INDUSTRY {
                warn!("No industry found for {}", symbol);
            }
            entries.push(UniverseEntry {
                symbol: symbol.clone(),
                industry,
            });

            let done = i + 1;
            let every = self.options.cooldown_every;
            if every > 0 && done % every == 0 && done < total {
                info!("Progress: {}/{} completed. Cooling down", done, total);
                self.sleeper.sleep(self.options.cooldown).await;
            }
        }

        entries
    }

    /// Write `ticker,symbol,industry` rows.
    pub fn write_csv(&self, path: impl AsRef<Path>, entries: &[UniverseEntry]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(["ticker", "symbol", "industry"])?;
        for entry in entries {
            let ticker = format!("{}:{}", self.options.exchange, entry.symbol);
            writer.write_record([
                ticker.as_str(),
                entry.symbol.as_str(),
                entry.industry.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read tickers from `input`, label them, and write `output`.
    pub async fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<EnrichmentSummary> {
        let symbols = load_tickers(input)?;
        info!("Fetching industry data for {} symbols", symbols.len());

        let entries = self.enrich(&symbols).await;
        self.write_csv(output.as_ref(), &entries)?;
        info!("Data saved to {}", output.as_ref().display());

        Ok(EnrichmentSummary::from_entries(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::SymbolUniverse;
    use aksmarket_market_data::{MarketDataError, QuoteRecord, RateLimit};
    use async_trait::async_trait;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;

    struct ScriptedProvider {
        labels: HashMap<String, serde_json::Value>,
        fail_first: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(labels: &[(&str, serde_json::Value)]) -> Self {
            Self {
                labels: labels
                    .iter()
                    .map(|(s, v)| (s.to_string(), v.clone()))
                    .collect(),
                fail_first: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for ScriptedProvider {
        fn id(&self) -> &'static str {
            "SCRIPTED"
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit {
                requests_per_minute: 60_000,
                burst_capacity: 1_000.0,
            }
        }

        async fn get_quote(&self, symbol: &str) -> std::result::Result<QuoteRecord, MarketDataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if let Some(left) = self.fail_first.lock().unwrap().get_mut(symbol) {
                if *left > 0 {
                    *left -= 1;
                    return Err(MarketDataError::ProviderError {
                        provider: "SCRIPTED".to_string(),
                        message: "connection reset".to_string(),
                    });
                }
            }
            match self.labels.get(symbol) {
                Some(info) => Ok(serde_json::from_value(json!({ "industryInfo": info })).unwrap()),
                None => Err(MarketDataError::SymbolNotFound(symbol.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn enricher(provider: ScriptedProvider) -> (IndustryEnricher, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let enricher = IndustryEnricher::new(
            Arc::new(provider),
            Arc::new(RateLimiter::new()),
            sleeper.clone(),
            EnrichOptions::default(),
        );
        (enricher, sleeper)
    }

    #[tokio::test]
    async fn test_label_fallback_chain() {
        let (enricher, _) = enricher(ScriptedProvider::new(&[
            ("TCS", json!({"industry": "IT - Software", "sector": "Information Technology"})),
            ("SBIN", json!({"industry": "", "sector": "Financial Services"})),
            ("ACC", json!({"basicIndustry": "Cement & Cement Products"})),
            ("NONE", json!({})),
        ]));

        assert_eq!(enricher.industry_for("TCS").await, "IT - Software");
        assert_eq!(enricher.industry_for("SBIN").await, "Financial Services");
        assert_eq!(enricher.industry_for("ACC").await, "Cement & Cement Products");
        assert_eq!(enricher.industry_for("NONE").await, "N/A");
    }

    #[tokio::test]
    async fn test_any_error_is_retried_linearly() {
        let provider = ScriptedProvider::new(&[("TCS", json!({"industry": "IT"}))]);
        provider.fail_first.lock().unwrap().insert("TCS".to_string(), 2);
        let (enricher, sleeper) = enricher(provider);

        assert_eq!(enricher.industry_for("TCS").await, "IT");
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_persistent_failure_is_unknown() {
        let provider = ScriptedProvider::new(&[("TCS", json!({"industry": "IT"}))]);
        provider.fail_first.lock().unwrap().insert("TCS".to_string(), 5);
        let (enricher, sleeper) = enricher(provider);

        assert_eq!(enricher.industry_for("TCS").await, "N/A");
        assert_eq!(sleeper.delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_retried() {
        let provider = ScriptedProvider::new(&[]);
        let (enricher, sleeper) = enricher(provider);

        assert_eq!(enricher.industry_for("GONE").await, "N/A");
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cooldown_every_ten_symbols() {
        let labels: Vec<(String, serde_json::Value)> = (0..25)
            .map(|i| (format!("S{i}"), json!({"industry": "X"})))
            .collect();
        let refs: Vec<(&str, serde_json::Value)> =
            labels.iter().map(|(s, v)| (s.as_str(), v.clone())).collect();
        let (enricher, sleeper) = enricher(ScriptedProvider::new(&refs));
        let symbols: Vec<String> = labels.iter().map(|(s, _)| s.clone()).collect();

        let entries = enricher.enrich(&symbols).await;

        assert_eq!(entries.len(), 25);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_run_writes_enriched_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("nifty100.csv");
        let output = dir.path().join("nifty100_with_industries.csv");
        let mut file = std::fs::File::create(&input).unwrap();
        writeln!(file, "ticker\nNSE:TCS\nNSE:INFY\nNSE:GONE\nNSE:TCS").unwrap();

        let (enricher, _) = enricher(ScriptedProvider::new(&[
            ("TCS", json!({"industry": "IT"})),
            ("INFY", json!({"sector": "IT"})),
        ]));

        let summary = enricher.run(&input, &output).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.unknown, 1);
        assert_eq!(
            summary.distribution,
            vec![("IT".to_string(), 2), ("N/A".to_string(), 1)]
        );

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("ticker,symbol,industry\nNSE:TCS,TCS,IT\n"));

        let universe = SymbolUniverse::load(&output).unwrap();
        assert_eq!(universe.len(), 3);
        assert_eq!(universe.industries(), vec!["IT"]);
    }
}
