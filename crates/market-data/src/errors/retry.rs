/// Classification for retry policy.
///
/// | Class | Sleep and retry? |
/// |-------|------------------|
/// | `Never` | No, give up on the symbol |
/// | `WithBackoff` | Yes, while attempts remain |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - unknown symbol, empty range, or an unexpected failure.
    Never,

    /// Transient, rate-limit shaped failure. Sleep with backoff and retry.
    WithBackoff,
}

/// Lower-case substrings that mark a provider message as rate-limit shaped.
///
/// `expecting value` / `expected value` come from JSON decoders fed an HTML
/// block page; Yahoo reports throttled tickers as "possibly delisted".
pub const RATE_LIMIT_SIGNATURES: &[&str] = &[
    "rate",
    "429",
    "too many requests",
    "expecting value",
    "expected value",
    "delisted",
];

/// Case-insensitive match of `message` against [`RATE_LIMIT_SIGNATURES`].
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_SIGNATURES.iter().any(|sig| lower.contains(sig))
}
