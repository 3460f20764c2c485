//! Time-bounded response cache.
//!
//! Repeat listing calls inside the TTL window are answered from the cache
//! instead of the network. Entries expire on read; nothing runs in the
//! background. Time comes from `tokio::time`, so paused-clock tests can
//! step over the window.
//!
//! Every `invalidate` or `clear` bumps a generation counter. A caller that
//! fetches on a miss reads `generation()` before sending and stores with
//! `insert_if_current`, so a response that raced a mutation is dropped
//! instead of being served for a whole window.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct Slots<K, V> {
    entries: HashMap<K, Entry<V>>,
    generation: u64,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<Slots<K, V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<K, V>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`. An expired entry is evicted and `None` returned.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut slots = self.lock();
        match slots.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                slots.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn entry(&self, value: V) -> Entry<V> {
        Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let entry = self.entry(value);
        self.lock().entries.insert(key, entry);
    }

    /// Counter bumped by every `invalidate` and `clear`.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Store `value` only if nothing was invalidated since `generation` was
    /// read. Returns whether the value was stored.
    pub fn insert_if_current(&self, generation: u64, key: K, value: V) -> bool {
        let entry = self.entry(value);
        let mut slots = self.lock();
        if slots.generation != generation {
            return false;
        }
        slots.entries.insert(key, entry);
        true
    }

    pub fn invalidate(&self, key: &K) {
        let mut slots = self.lock();
        slots.entries.remove(key);
        slots.generation += 1;
    }

    pub fn clear(&self) {
        let mut slots = self.lock();
        slots.entries.clear();
        slots.generation += 1;
    }
}
