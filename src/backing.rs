//! Storage layer: the plain, single-threaded map a `ConcurrentMap` locks.
//!
//! `Backing` is the seam between the lock discipline and the container
//! doing the actual work. Two implementations ship: `BTreeMap` (ordered,
//! `K: Ord`) and `hashbrown::HashMap` (unordered, `K: Hash + Eq`). Key
//! order is never observable through `ConcurrentMap`, so either is a valid
//! choice. Nothing here is thread-aware; callers must hold exclusive access.

use core::hash::{BuildHasher, Hash};
use std::collections::BTreeMap;

/// Keyed storage with unique keys and owned values.
///
/// Methods only invoke user code through `K`'s comparison (`Ord` or
/// `Hash + Eq`) and `V`'s `Drop`.
pub trait Backing<K, V> {
    /// Insert or overwrite; returns the previous value if the key existed.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Remove and return the value, moving it out of storage.
    fn remove(&mut self, key: &K) -> Option<V>;

    fn get(&self, key: &K) -> Option<&V>;

    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn clear(&mut self);
}

impl<K: Ord, V> Backing<K, V> for BTreeMap<K, V> {
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    #[inline]
    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    #[inline]
    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        BTreeMap::get_mut(self, key)
    }

    #[inline]
    fn contains_key(&self, key: &K) -> bool {
        BTreeMap::contains_key(self, key)
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn clear(&mut self) {
        BTreeMap::clear(self)
    }
}

impl<K, V, S> Backing<K, V> for hashbrown::HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        hashbrown::HashMap::insert(self, key, value)
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        hashbrown::HashMap::remove(self, key)
    }

    #[inline]
    fn get(&self, key: &K) -> Option<&V> {
        hashbrown::HashMap::get(self, key)
    }

    #[inline]
    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        hashbrown::HashMap::get_mut(self, key)
    }

    #[inline]
    fn contains_key(&self, key: &K) -> bool {
        hashbrown::HashMap::contains_key(self, key)
    }

    fn len(&self) -> usize {
        hashbrown::HashMap::len(self)
    }

    fn clear(&mut self) {
        hashbrown::HashMap::clear(self)
    }
}
