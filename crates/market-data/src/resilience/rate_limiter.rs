//! Token bucket rate limiter shared by every provider call in a run.
//!
//! Each provider id gets its own bucket. Callers await [`RateLimiter::acquire`]
//! before each request, so pacing is independent of how many tasks run at
//! once or how batches are cut.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::provider::RateLimit;

/// Token bucket for a single provider.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was refilled.
    last_update: Instant,
    /// Refill rate in tokens per second.
    rate: f64,
    /// Maximum bucket capacity.
    capacity: f64,
}

impl TokenBucket {
    fn from_limit(limit: &RateLimit) -> Self {
        let capacity = limit.burst_capacity.max(1.0);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(limit.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Take a token if one is available, otherwise report how long until one is.
    fn take(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let seconds_needed = (1.0 - self.tokens) / self.rate;
            Err(Duration::from_secs_f64(seconds_needed))
        }
    }
}

/// Per-provider token bucket rate limiter.
///
/// Buckets are created on first use, from the limit registered with
/// [`configure`](Self::configure) or [`RateLimit::default`].
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<&'static str, TokenBucket>>,
    limits: Mutex<HashMap<&'static str, RateLimit>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the buckets, recovering from poison.
    ///
    /// A poisoned bucket map only means slightly wrong pacing.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<&'static str, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_limits(&self) -> MutexGuard<'_, HashMap<&'static str, RateLimit>> {
        self.limits.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter limits mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register the limit for a provider, resetting its bucket.
    pub fn configure(&self, provider: &'static str, limit: RateLimit) {
        self.lock_limits().insert(provider, limit);
        self.lock_buckets().remove(provider);
    }

    fn bucket_for(&self, provider: &'static str) -> TokenBucket {
        let limits = self.lock_limits();
        match limits.get(provider) {
            Some(limit) => TokenBucket::from_limit(limit),
            None => TokenBucket::from_limit(&RateLimit::default()),
        }
    }

    fn take(&self, provider: &'static str) -> Result<(), Duration> {
        let mut buckets = self.lock_buckets();
        if !buckets.contains_key(provider) {
            let bucket = self.bucket_for(provider);
            buckets.insert(provider, bucket);
        }
        match buckets.get_mut(provider) {
            Some(bucket) => bucket.take(),
            None => Ok(()),
        }
    }

    /// Wait until a token is available for `provider`, then take it.
    pub async fn acquire(&self, provider: &'static str) {
        loop {
            match self.take(provider) {
                Ok(()) => {
                    debug!("Rate limiter: acquired token for '{}'", provider);
                    return;
                }
                Err(wait) => {
                    debug!("Rate limiter: waiting {:?} for '{}'", wait, provider);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Take a token without waiting. Returns false when rate limited.
    pub fn try_acquire(&self, provider: &'static str) -> bool {
        self.take(provider).is_ok()
    }

    /// Tokens currently available for `provider`.
    pub fn remaining_tokens(&self, provider: &'static str) -> f64 {
        let mut buckets = self.lock_buckets();
        match buckets.get_mut(provider) {
            Some(bucket) => {
                bucket.refill();
                bucket.tokens
            }
            None => {
                drop(buckets);
                self.bucket_for(provider).tokens
            }
        }
    }

    /// Forget the bucket for `provider`, restoring full burst capacity.
    pub fn reset(&self, provider: &'static str) {
        self.lock_buckets().remove(provider);
    }
}
