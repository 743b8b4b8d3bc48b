//! Pacing and retry for provider calls.

mod rate_limiter;
mod retry;

pub use rate_limiter::RateLimiter;
pub use retry::{Backoff, FetchOutcome, RetryOn, RetryPolicy, Sleeper, TokioSleeper};
