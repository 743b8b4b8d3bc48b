//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all provider operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::{is_rate_limit_message, RetryClass, RATE_LIMIT_SIGNATURES};

use thiserror::Error;

/// Errors that can occur while talking to a market data provider.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which decides whether the
/// retry policy backs off and tries again or gives up on the symbol.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but the provider returned no bars for the window.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider answered with a body that is not the expected JSON.
    ///
    /// The quote endpoint serves an HTML block page instead of JSON when it
    /// throttles a client, so this is treated like a rate limit.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        /// The provider that returned the body
        provider: String,
        /// Decoder message
        message: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Build a provider error, promoting it to [`MarketDataError::RateLimited`]
    /// when the message carries a rate-limit signature.
    pub fn from_provider_message(provider: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        if is_rate_limit_message(&message) {
            Self::RateLimited {
                provider: provider.to_string(),
            }
        } else {
            Self::ProviderError {
                provider: provider.to_string(),
                message,
            }
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::WithBackoff`]: transient, rate-limit shaped; sleep and retry
    /// - [`RetryClass::Never`]: terminal; retrying won't help
    ///
    /// # Examples
    ///
    /// ```
    /// use aksmarket_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "NSE".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::InvalidResponse { .. } => {
                RetryClass::WithBackoff
            }

            Self::ProviderError { message, .. } if is_rate_limit_message(message) => {
                RetryClass::WithBackoff
            }

            Self::Network(e) => {
                let throttled = e
                    .status()
                    .map(|s| s == reqwest::StatusCode::TOO_MANY_REQUESTS)
                    .unwrap_or(false);
                if throttled || e.is_timeout() || e.is_decode() {
                    RetryClass::WithBackoff
                } else {
                    RetryClass::Never
                }
            }

            Self::SymbolNotFound(_) | Self::NoDataForRange | Self::ProviderError { .. } => {
                RetryClass::Never
            }
        }
    }

    /// True when the error is rate-limit shaped.
    pub fn is_rate_limited(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }
}
