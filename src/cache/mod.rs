//! Cache Module
//!
//! Response caching with lifetime expiry, oldest-first eviction and
//! per-key coalescing of concurrent upstream fetches.

mod entry;
mod key;
mod order;
mod singleflight;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::CacheKey;
pub use order::InsertionOrder;
pub use singleflight::{Flight, FlightGuard, FlightWaiter, Outcome, SingleFlight};
pub use stats::CacheStats;
pub use store::ResponseCache;

// == Public Constants ==
/// Default entry lifetime in milliseconds (one hour)
pub const DEFAULT_LIFETIME_MS: u64 = 60 * 60 * 1000;

/// Default maximum number of cached responses
pub const DEFAULT_MAX_SIZE: usize = 20_000;
