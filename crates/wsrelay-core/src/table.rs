//! Key/value table with a uniform time-to-live and a liveness veto.
//!
//! Expiry is lazy: nothing fires per entry. A caller periodically runs
//! [`ExpiringTable::sweep`] with a predicate; entries past their deadline
//! that the predicate wants to keep get a fresh deadline, the rest are
//! removed and handed back to the caller.
//!
//! The table is not synchronized. The owner wraps it in whatever lock its
//! compound operations need.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

struct Entry<V> {
    value: V,
    deadline: Instant,
}

/// Mapping from key to value where every entry carries an expiry deadline.
pub struct ExpiringTable<K, V> {
    entries: HashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> ExpiringTable<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty table applying `ttl` to every insert.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// TTL applied on insert and on a vetoed expiry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or replace `key`, resetting its deadline. Returns the replaced value.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let deadline = Instant::now() + self.ttl;
        self.entries
            .insert(key, Entry { value, deadline })
            .map(|old| old.value)
    }

    /// Look up `key` regardless of its deadline.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Mutable lookup regardless of deadline. Does not touch the deadline.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key).map(|e| &mut e.value)
    }

    /// Look up `key`, hiding it if it is past its deadline at `now` and
    /// `keep` does not vouch for it.
    ///
    /// This gives readers the same answer the next sweep would, without
    /// waiting for that sweep.
    pub fn get_checked(&self, key: &K, now: Instant, keep: impl FnOnce(&V) -> bool) -> Option<&V> {
        let entry = self.entries.get(key)?;
        if entry.deadline > now || keep(&entry.value) {
            Some(&entry.value)
        } else {
            None
        }
    }

    /// Whether `key` is present and its deadline has passed at `now`.
    pub fn is_expired(&self, key: &K, now: Instant) -> bool {
        self.entries.get(key).is_some_and(|e| e.deadline <= now)
    }

    /// Current deadline for `key`.
    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.entries.get(key).map(|e| e.deadline)
    }

    /// Remove `key` unconditionally. Absent keys are a no-op.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict every entry past its deadline at `now` unless `keep` vetoes it.
    ///
    /// Vetoed entries get a new deadline of `now + ttl`. Evicted entries are
    /// returned so the caller can run its eviction side effects.
    pub fn sweep(&mut self, now: Instant, mut keep: impl FnMut(&K, &V) -> bool) -> Vec<(K, V)> {
        let ttl = self.ttl;
        let mut expired = Vec::new();
        for (key, entry) in &mut self.entries {
            if entry.deadline > now {
                continue;
            }
            if keep(key, &entry.value) {
                entry.deadline = now + ttl;
            } else {
                expired.push(key.clone());
            }
        }

        expired
            .into_iter()
            .filter_map(|key| self.entries.remove(&key).map(|e| (key, e.value)))
            .collect()
    }
}
