//! National Stock Exchange of India quote provider.
//!
//! Fetches the `quote-equity` record for a symbol. The API refuses requests
//! that don't carry the cookies handed out by the public site, so the client
//! keeps a cookie store and visits the home page once per session before the
//! first API call (and again after the API rejects the session).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::QuoteRecord;
use crate::provider::{QuoteProvider, RateLimit};

const PROVIDER_ID: &str = "NSE";

const BASE_URL: &str = "https://www.nseindia.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// NSE exchange-quote provider.
pub struct NseProvider {
    client: reqwest::Client,
    base_url: String,
    /// Whether the cookie store currently holds a session.
    session_ready: RwLock<bool>,
}

impl NseProvider {
    /// Create a provider with the default 30 second request timeout.
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a provider with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, MarketDataError> {
        Self::with_base_url(BASE_URL, timeout)
    }

    /// Create a provider against a different host (mirrors, local fixtures).
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_ready: RwLock::new(false),
        })
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!(
            "{}/api/quote-equity?symbol={}",
            self.base_url,
            encode(symbol)
        )
    }

    /// Visit the home page so the cookie store holds a session.
    async fn ensure_session(&self) -> Result<(), MarketDataError> {
        if *self.session_ready.read().await {
            return Ok(());
        }

        let mut ready = self.session_ready.write().await;
        if *ready {
            return Ok(());
        }

        debug!("Opening NSE session");
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        *ready = true;
        Ok(())
    }

    async fn reset_session(&self) {
        *self.session_ready.write().await = false;
    }

    fn map_transport_error(e: reqwest::Error) -> MarketDataError {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            }
        } else {
            MarketDataError::Network(e)
        }
    }

    /// Parse a quote body. An HTML block page or truncated body is reported
    /// as [`MarketDataError::InvalidResponse`].
    fn parse_quote(symbol: &str, body: &str) -> Result<QuoteRecord, MarketDataError> {
        let record: QuoteRecord =
            serde_json::from_str(body).map_err(|e| MarketDataError::InvalidResponse {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        if record.is_empty() {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        Ok(record)
    }
}

#[async_trait]
impl QuoteProvider for NseProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst_capacity: 5.0,
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        self.ensure_session().await?;

        debug!("Fetching quote for {} from NSE", symbol);

        let response = self
            .client
            .get(self.quote_url(symbol))
            .header(
                header::REFERER,
                format!(
                    "{}/get-quotes/equity?symbol={}",
                    self.base_url,
                    encode(symbol)
                ),
            )
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.reset_session().await;
                // Expired cookies look exactly like throttling from the outside.
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
            }
            s if !s.is_success() => {
                warn!("NSE returned {} for {}", s, symbol);
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("HTTP {}", s),
                });
            }
            _ => {}
        }

        let body = response.text().await.map_err(Self::map_transport_error)?;
        Self::parse_quote(symbol, &body)
    }
}
