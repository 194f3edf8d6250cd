//! Process-wide profile memo with wholesale, interval-based invalidation.
//!
//! Entries never expire individually. Once `interval` has elapsed since the
//! last clear, the whole map is dropped, either lazily on the next access or
//! by the background sweeper from [`ProfileCache::spawn_sweeper`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::models::Profile;

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

pub struct ProfileCache {
    entries: RwLock<HashMap<String, Profile>>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    last_clear: Mutex<Instant>,
}

impl ProfileCache {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let started = clock.now();
        Self {
            entries: RwLock::new(HashMap::new()),
            interval,
            clock,
            last_clear: Mutex::new(started),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn get(&self, id: &str) -> Option<Profile> {
        self.clear_if_due();
        self.entries.read().get(id).cloned()
    }

    pub fn insert(&self, profile: Profile) {
        self.clear_if_due();
        self.entries.write().insert(profile.id.clone(), profile);
    }

    /// Drops every entry and restarts the interval.
    pub fn clear(&self) {
        let dropped = {
            let mut entries = self.entries.write();
            let count = entries.len();
            entries.clear();
            count
        };
        *self.last_clear.lock() = self.clock.now();
        tracing::info!(target: "queries::profile", dropped, "Clearing profile cache");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear_if_due(&self) {
        let due = {
            let last_clear = self.last_clear.lock();
            self.clock.now().saturating_duration_since(*last_clear) >= self.interval
        };
        if due {
            self.clear();
        }
    }

    /// Clears the cache every `interval` on the tokio runtime until the
    /// cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match cache.upgrade() {
                    Some(cache) => cache.clear(),
                    None => break,
                }
            }
        })
    }
}
