//! In-memory cache for resolved emissions records.
//!
//! - Deterministic cache keys derived from the identifying row fields
//! - Timed entries with a default TTL, permanent entries for priority rows
//! - Lazy expiry on read plus a background sweeper

pub mod key;
pub mod store;

pub use key::{compute_cache_key, derive_key};
pub use store::{CachedEntry, EmissionsCache, EmissionsStore, Expiry};
