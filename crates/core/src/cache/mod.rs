//! Time-to-live caches and the clock they read.

mod clock;
mod ttl_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl_cache::TtlCache;
