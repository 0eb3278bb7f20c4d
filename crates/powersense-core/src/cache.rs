//! The single shared slot holding the most recently published reading.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::reading::Reading;

/// A published reading plus the time it arrived in the cache.
#[derive(Debug, Clone)]
pub struct CachedReading {
    pub reading: Reading,
    pub cached_at: DateTime<Utc>,
}

/// Most-recent-reading cache.
///
/// One writer (the poll loop) and any number of concurrent readers (HTTP
/// handlers). Readers clone the snapshot out, so the lock is held only for
/// the copy and never across I/O. The slot is replaced whole under the
/// write lock, so a reader observes either the old or the new reading,
/// never a torn mix.
pub struct StatusCache {
    slot: RwLock<CachedReading>,
}

impl StatusCache {
    /// Seed the cache with the initial reading. The agent runs one poll
    /// cycle synchronously at startup so the first reader never sees an
    /// empty slot.
    pub fn new(initial: Reading) -> Self {
        Self {
            slot: RwLock::new(CachedReading {
                reading: initial,
                cached_at: Utc::now(),
            }),
        }
    }

    /// Replace the slot with a fresh reading. Called once per poll cycle,
    /// successful or not — the cache always holds the most recent attempt.
    pub fn publish(&self, reading: Reading) {
        let mut slot = self.slot.write().unwrap();
        *slot = CachedReading {
            reading,
            cached_at: Utc::now(),
        };
    }

    /// Clone out the latest published reading. Non-blocking with respect to
    /// in-flight poll cycles; never triggers a fresh query.
    pub fn snapshot(&self) -> CachedReading {
        self.slot.read().unwrap().clone()
    }
}
