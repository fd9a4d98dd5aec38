//! In-memory emissions cache with timed and permanent entries.
//!
//! Entries live in a sharded concurrent map. A timed entry is invisible once
//! its deadline passes, whether or not the sweeper has removed it yet.
//! Deadlines use the tokio clock, so paused-time tests are deterministic.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::model::EmissionsRecord;

/// The cache operations the measure engine depends on.
///
/// Neither call can fail: absence is a normal outcome.
pub trait EmissionsCache: Send + Sync {
    /// Return the live record for `key`, if any.
    fn get(&self, key: &str) -> Option<EmissionsRecord>;

    /// Insert or replace the record for `key`.
    ///
    /// Priority records never expire; others expire after the default TTL.
    fn set(&self, key: &str, record: EmissionsRecord, priority: bool);
}

/// Expiry class of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Timed(Instant),
    Permanent,
}

impl Expiry {
    fn is_expired(&self, now: Instant) -> bool {
        match self {
            Expiry::Timed(deadline) => *deadline <= now,
            Expiry::Permanent => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: EmissionsRecord,
    expiry: Expiry,
}

/// A live entry as reported by [`EmissionsStore::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub record: EmissionsRecord,
    pub expiry: Expiry,
    /// Time left before a timed entry expires; `None` for permanent entries.
    pub remaining: Option<Duration>,
}

/// Longest TTL or sweep interval the store honours; longer values are capped.
pub const MAX_EXPIRY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Concurrency-safe in-memory emissions cache.
#[derive(Debug)]
pub struct EmissionsStore {
    entries: DashMap<String, Entry>,
    default_ttl: Duration,
}

impl EmissionsStore {
    /// Create an empty store whose non-priority entries live for `default_ttl`,
    /// capped at [`MAX_EXPIRY`].
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: DashMap::new(), default_ttl: default_ttl.min(MAX_EXPIRY) }
    }

    /// Return the live entry for `key` together with its expiry details.
    ///
    /// An expired entry found here is removed on the spot.
    pub fn lookup(&self, key: &str) -> Option<CachedEntry> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.expiry.is_expired(now) {
                let remaining = match entry.expiry {
                    Expiry::Timed(deadline) => Some(deadline.saturating_duration_since(now)),
                    Expiry::Permanent => None,
                };
                return Some(CachedEntry { record: entry.record.clone(), expiry: entry.expiry, remaining });
            }
        }

        // A concurrent `set` may have replaced the entry since the read guard
        // was dropped; only remove it if it is still expired.
        self.entries.remove_if(key, |_, e| e.expiry.is_expired(now));
        None
    }

    /// Remove every expired timed entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, e| {
            let expired = e.expiry.is_expired(now);
            removed += usize::from(expired);
            !expired
        });
        removed
    }

    /// Remove every entry, permanent ones included. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start the background sweeper.
    ///
    /// The first sweep runs one `interval` after the call; intervals longer
    /// than [`MAX_EXPIRY`] are capped. The task only holds
    /// a weak reference and stops once the store has been dropped; abort the
    /// returned handle to stop it earlier.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let interval = interval.min(MAX_EXPIRY);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    tracing::debug!("emissions store dropped, stopping sweeper");
                    break;
                };
                let removed = store.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = store.len(), "swept expired cache entries");
                }
            }
        })
    }
}

impl EmissionsCache for EmissionsStore {
    fn get(&self, key: &str) -> Option<EmissionsRecord> {
        self.lookup(key).map(|e| e.record)
    }

    fn set(&self, key: &str, record: EmissionsRecord, priority: bool) {
        let expiry = if priority { Expiry::Permanent } else { Expiry::Timed(Instant::now() + self.default_ttl) };
        self.entries.insert(key.to_string(), Entry { record, expiry });
    }
}
