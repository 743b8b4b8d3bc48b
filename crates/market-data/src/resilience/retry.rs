//! Retry with backoff around a single provider call.
//!
//! The policy never returns an error to its caller. Every call ends in a
//! [`FetchOutcome`], which keeps "the provider said no" apart from "we gave
//! up after being throttled" so callers can decide between a placeholder and
//! an alert.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;

use crate::errors::{MarketDataError, RetryClass};

/// Result of a retried fetch.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// The call succeeded.
    Fetched(T),
    /// The call failed with an error that retrying won't fix.
    Failed(MarketDataError),
    /// Every attempt was rate limited.
    Exhausted {
        attempts: u32,
        last_error: MarketDataError,
    },
}

impl<T> FetchOutcome<T> {
    /// The fetched value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Fetched(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }

    /// The error behind a failed or exhausted outcome.
    pub fn error(&self) -> Option<&MarketDataError> {
        match self {
            Self::Fetched(_) => None,
            Self::Failed(error) => Some(error),
            Self::Exhausted { last_error, .. } => Some(last_error),
        }
    }

    /// Transform the fetched value, keeping failures as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Fetched(value) => FetchOutcome::Fetched(f(value)),
            Self::Failed(error) => FetchOutcome::Failed(error),
            Self::Exhausted {
                attempts,
                last_error,
            } => FetchOutcome::Exhausted {
                attempts,
                last_error,
            },
        }
    }
}

/// Something that can pause the current task.
///
/// Production code sleeps on the tokio timer; tests record the requested
/// delays instead of waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How the delay grows between attempts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backoff {
    /// `base × 2^attempt`
    Exponential,
    /// `base × (attempt + 1)`
    Linear,
}

/// Which errors are worth another attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryOn {
    /// Only rate-limit shaped errors; anything else fails immediately.
    RateLimited,
    /// Every error except an unknown symbol, which no retry can fix.
    AnyError,
}

/// Retry policy for one provider call.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first. Zero behaves as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
    /// Upper bound of a uniform random delay added to every backoff.
    pub jitter: Option<Duration>,
    pub retry_on: RetryOn,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Exponential backoff on rate-limit errors.
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Exponential,
            jitter: None,
            retry_on: RetryOn::RateLimited,
        }
    }

    /// Linear backoff on any error.
    pub fn linear_any_error(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Linear,
            jitter: None,
            retry_on: RetryOn::AnyError,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Deterministic part of the delay after the zero-based `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential => self.base_delay.saturating_mul(1u32 << attempt.min(16)),
            Backoff::Linear => self.base_delay.saturating_mul(attempt.saturating_add(1)),
        }
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        match self.jitter {
            Some(jitter) if !jitter.is_zero() => {
                let extra = rand::thread_rng().gen_range(0.0..jitter.as_secs_f64());
                delay + Duration::from_secs_f64(extra)
            }
            _ => delay,
        }
    }

    fn should_retry(&self, error: &MarketDataError) -> bool {
        match self.retry_on {
            RetryOn::AnyError => !matches!(error, MarketDataError::SymbolNotFound(_)),
            RetryOn::RateLimited => error.retry_class() == RetryClass::WithBackoff,
        }
    }

    /// Run `fetch` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `label` only appears in log lines (usually the symbol).
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, label: &str, fetch: F) -> FetchOutcome<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            let error = match fetch().await {
                Ok(value) => return FetchOutcome::Fetched(value),
                Err(error) => error,
            };
            attempts += 1;

            if !self.should_retry(&error) {
                warn!("Error fetching {}: {}", label, error);
                return FetchOutcome::Failed(error);
            }

            if attempts >= max_attempts {
                warn!("Max retries exceeded for {}: {}", label, error);
                return if error.is_rate_limited() {
                    FetchOutcome::Exhausted {
                        attempts,
                        last_error: error,
                    }
                } else {
                    FetchOutcome::Failed(error)
                };
            }

            let delay = self.jittered_delay(attempts - 1);
            debug!(
                "[Retry {}/{}] Issue with {} ({}), waiting {:.1}s",
                attempts,
                max_attempts,
                label,
                error,
                delay.as_secs_f64()
            );
            sleeper.sleep(delay).await;
        }
    }
}
