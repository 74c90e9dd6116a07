//! Bounded Expiring Cache
//!
//! A small concurrent cache with a capacity bound and a time-based expiry
//! policy, used as the memoization primitive for every query shape. Expiry
//! is lazy: an expired slot is dropped when read. Capacity is enforced on
//! insert by evicting expired slots first and then the stalest live slot.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// When a cached value stops being served.
#[derive(Debug, Clone, Copy)]
pub enum ExpiryPolicy {
    /// Fixed age after insertion, regardless of reads.
    AfterWrite(Duration),
    /// Idle window: every read pushes the deadline out.
    AfterAccess(Duration),
}

struct Slot<V> {
    value: V,
    written: Instant,
    /// Milliseconds since the cache was created, updated on every read.
    /// Atomic so reads can refresh it through a shared map guard.
    accessed_ms: AtomicU64,
}

pub struct BoundedCache<K, V> {
    slots: DashMap<K, Slot<V>>,
    capacity: usize,
    policy: ExpiryPolicy,
    epoch: Instant,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, policy: ExpiryPolicy) -> Self {
        assert!(capacity >= 1, "cache capacity must be at least 1");
        Self {
            slots: DashMap::new(),
            capacity,
            policy,
            epoch: Instant::now(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub(crate) fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.slots.get(key) {
            Some(slot) => {
                if self.is_expired(&slot, now) {
                    true
                } else {
                    slot.accessed_ms
                        .store(self.elapsed_ms(now), Ordering::Relaxed);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(slot.value.clone());
                }
            }
            None => false,
        };

        if expired {
            self.slots.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub(crate) fn insert_at(&self, key: K, value: V, now: Instant) {
        if self.slots.len() >= self.capacity && !self.slots.contains_key(&key) {
            self.evict_one(now);
        }

        self.slots.insert(
            key,
            Slot {
                value,
                written: now,
                accessed_ms: AtomicU64::new(self.elapsed_ms(now)),
            },
        );
    }

    /// Drops expired slots, and if none were expired, the slot with the
    /// oldest relevant timestamp. Called while the cache is at capacity.
    fn evict_one(&self, now: Instant) {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !self.is_expired(slot, now));
        if self.slots.len() < before {
            return;
        }

        let mut stalest: Option<(K, u64)> = None;
        for slot in self.slots.iter() {
            let age_key = match self.policy {
                ExpiryPolicy::AfterWrite(_) => {
                    slot.written.duration_since(self.epoch).as_millis() as u64
                }
                ExpiryPolicy::AfterAccess(_) => slot.accessed_ms.load(Ordering::Relaxed),
            };
            let is_staler = stalest.as_ref().is_none_or(|(_, best)| age_key < *best);
            if is_staler {
                stalest = Some((slot.key().clone(), age_key));
            }
        }
        if let Some((key, _)) = stalest {
            self.slots.remove(&key);
        }
    }

    fn is_expired(&self, slot: &Slot<V>, now: Instant) -> bool {
        match self.policy {
            ExpiryPolicy::AfterWrite(ttl) => now.duration_since(slot.written) > ttl,
            ExpiryPolicy::AfterAccess(ttl) => {
                let accessed = Duration::from_millis(slot.accessed_ms.load(Ordering::Relaxed));
                now.duration_since(self.epoch).saturating_sub(accessed) > ttl
            }
        }
    }

    fn elapsed_ms(&self, now: Instant) -> u64 {
        now.duration_since(self.epoch).as_millis() as u64
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every slot. Counters keep running.
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Lifetime (hits, misses) counters.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
