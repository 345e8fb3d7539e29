//! Bounded last-seen caches with a swappable eviction strategy.
//!
//! | Policy            | Insert                 | At capacity                         |
//! |-------------------|------------------------|-------------------------------------|
//! | `MostRecentFirst` | shift, place at 0      | drop the last (oldest) entry        |
//! | `OldestTimestamp` | append                 | remove the smallest stamp, compact  |
//!
//! Membership is a linear scan; capacities are small and fixed.

use core::marker::PhantomData;

use heapless::Vec;

/// Wall / room-position tag cache depth.
pub const ROOM_CACHE_LEN: usize = 8;
/// Mop tag cache depth.
pub const MOP_CACHE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
    /// Tick of the last observation.
    pub stamp: u64,
}

/// Outcome of [`RecencyCache::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not in the cache before.
    New,
    /// Already cached; refreshed.
    Revisit,
    /// Identical to the most recent observation (only reported by
    /// ordered policies).
    Duplicate,
}

/// How entries are placed and evicted.
pub trait EvictionPolicy {
    /// Insert an entry that is not yet cached, evicting if full.
    fn insert<K, V, const N: usize>(entries: &mut Vec<Entry<K, V>, N>, entry: Entry<K, V>);

    /// Refresh the entry at `index` with `entry`.
    fn touch<K, V, const N: usize>(
        entries: &mut Vec<Entry<K, V>, N>,
        index: usize,
        entry: Entry<K, V>,
    ) -> Observation;
}

/// Ordered newest → oldest.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostRecentFirst;

impl EvictionPolicy for MostRecentFirst {
    fn insert<K, V, const N: usize>(entries: &mut Vec<Entry<K, V>, N>, entry: Entry<K, V>) {
        if N == 0 {
            return;
        }
        if entries.is_full() {
            entries.pop();
        }
        // Cannot fail: there is room after the pop.
        let _ = entries.insert(0, entry);
    }

    fn touch<K, V, const N: usize>(
        entries: &mut Vec<Entry<K, V>, N>,
        index: usize,
        entry: Entry<K, V>,
    ) -> Observation {
        if index == 0 {
            entries[0] = entry;
            return Observation::Duplicate;
        }
        entries.remove(index);
        let _ = entries.insert(0, entry);
        Observation::Revisit
    }
}

/// Unordered; the stalest entry goes first.
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestTimestamp;

impl EvictionPolicy for OldestTimestamp {
    fn insert<K, V, const N: usize>(entries: &mut Vec<Entry<K, V>, N>, entry: Entry<K, V>) {
        if N == 0 {
            return;
        }
        if entries.is_full() {
            let oldest = entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.stamp)
                .map(|(i, _)| i);
            if let Some(i) = oldest {
                entries.remove(i);
            }
        }
        let _ = entries.push(entry);
    }

    fn touch<K, V, const N: usize>(
        entries: &mut Vec<Entry<K, V>, N>,
        index: usize,
        entry: Entry<K, V>,
    ) -> Observation {
        entries[index] = entry;
        Observation::Revisit
    }
}

pub struct RecencyCache<K, V, const N: usize, P: EvictionPolicy> {
    entries: Vec<Entry<K, V>, N>,
    _policy: PhantomData<P>,
}

impl<K: PartialEq, V, const N: usize, P: EvictionPolicy> RecencyCache<K, V, N, P> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            _policy: PhantomData,
        }
    }

    /// Record a sighting of `key` at `now`.
    pub fn observe(&mut self, key: K, value: V, now: u64) -> Observation {
        let entry = Entry {
            key,
            value,
            stamp: now,
        };
        match self.position(&entry.key) {
            Some(i) => P::touch(&mut self.entries, i, entry),
            None => {
                P::insert(&mut self.entries, entry);
                Observation::New
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&Entry<K, V>> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut Entry<K, V>> {
        self.entries.iter_mut().find(|e| &e.key == key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<Entry<K, V>> {
        let i = self.position(key)?;
        Some(self.entries.remove(i))
    }

    /// Entries in storage order (newest first for `MostRecentFirst`).
    pub fn iter(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|e| &e.key == key)
    }
}

impl<K: PartialEq, V, const N: usize, P: EvictionPolicy> Default for RecencyCache<K, V, N, P> {
    fn default() -> Self {
        Self::new()
    }
}
