//! Generic in-memory query cache.
//!
//! This module is Midday-agnostic. It provides:
//! - deterministic cache keys derived from an operation and its
//!   arguments (`QueryKey`)
//! - a per-entry state machine (loading / success / error) with a
//!   freshness TTL, unused-entry eviction and bounded retry
//! - per-key single flight: concurrent fetches for one key share the
//!   first request instead of duplicating network traffic
//! - invalidation by exact key or by domain prefix

mod layer;
mod traits;

pub use layer::{CacheLayer, CachePolicy};
pub use traits::QueryKey;
