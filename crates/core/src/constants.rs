/// Industry label for symbols whose industry is unknown
pub const UNKNOWN_INDUSTRY: &str = "N/A";

/// Default N for the N-day historical comparison
pub const DEFAULT_COMPARISON_DAYS: u32 = 10;

/// Accepted range for the N-day comparison
pub const MIN_COMPARISON_DAYS: u32 = 1;
pub const MAX_COMPARISON_DAYS: u32 = 365;

/// Extra calendar days fetched on top of N to cover weekends and holidays
pub const HISTORY_PADDING_DAYS: u32 = 10;

/// Window for the average daily volume
pub const VOLUME_AVERAGE_DAYS: u32 = 30;

/// Cache lifetimes, in minutes
pub const QUOTE_TTL_MINUTES: i64 = 30;
pub const VOLUME_TTL_MINUTES: i64 = 30;
pub const HISTORY_TTL_MINUTES: i64 = 60;

/// Batch orchestration defaults
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 2000;

/// Clamp a requested comparison window, falling back to the default for zero.
pub fn normalize_days(days: u32) -> u32 {
    if days < MIN_COMPARISON_DAYS {
        DEFAULT_COMPARISON_DAYS
    } else {
        days.min(MAX_COMPARISON_DAYS)
    }
}
