//! ConcurrentMap: a single exclusive lock around a `Backing` store.

use crate::backing::Backing;
use crate::reentrancy::{DebugReentrancy, ReentrancyGuard};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use parking_lot::{Mutex, MutexGuard};
use std::collections::hash_map::RandomState;
use std::collections::BTreeMap;

/// A thread-safe map where every operation runs under one exclusive lock.
///
/// No reference into the map ever escapes a critical section: reads
/// either clone the value out (`find_copy`), run a callback under the
/// lock (`find_and`, `find_map`), or move the value out (`remove`,
/// `remove_if`). Share it across threads by reference.
///
/// Callbacks must not call back into the same map. Debug builds panic on
/// such reentrancy; release builds deadlock.
pub struct ConcurrentMap<K, V, M = BTreeMap<K, V>> {
    entries: Mutex<M>,
    reentrancy: DebugReentrancy,
    _kv: PhantomData<fn() -> (K, V)>,
}

/// Hash-backed variant; `K: Hash + Eq` instead of `K: Ord`.
pub type ConcurrentHashMap<K, V, S = RandomState> =
    ConcurrentMap<K, V, hashbrown::HashMap<K, V, S>>;

// Field order matters: the holder mark clears before the mutex unlocks.
struct Locked<'a, M> {
    _held: ReentrancyGuard<'a>,
    entries: MutexGuard<'a, M>,
}

impl<'a, M> Deref for Locked<'a, M> {
    type Target = M;
    fn deref(&self) -> &M {
        &self.entries
    }
}

impl<'a, M> DerefMut for Locked<'a, M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.entries
    }
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Ord,
{
    pub fn new() -> Self {
        Self::from_backing(BTreeMap::new())
    }
}

impl<K, V, S> ConcurrentMap<K, V, hashbrown::HashMap<K, V, S>>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_backing(hashbrown::HashMap::with_hasher(hasher))
    }
}

impl<K, V, M> ConcurrentMap<K, V, M>
where
    M: Backing<K, V>,
{
    /// Wrap existing storage; its entries become the map's initial contents.
    pub fn from_backing(entries: M) -> Self {
        Self {
            entries: Mutex::new(entries),
            reentrancy: DebugReentrancy::new(),
            _kv: PhantomData,
        }
    }

    fn lock(&self) -> Locked<'_, M> {
        // Check before blocking, otherwise a reentrant call never returns.
        self.reentrancy.check();
        let entries = self.entries.lock();
        Locked {
            _held: self.reentrancy.hold(),
            entries,
        }
    }

    /// Insert `value` under `key`, overwriting any existing value.
    ///
    /// Returns `true` for a fresh insertion and `false` for an overwrite.
    /// The value is moved in, so move-only `V` works for both paths; pass
    /// `value.clone()` to keep a copy.
    pub fn insert(&self, key: K, value: V) -> bool {
        let displaced = self.lock().insert(key, value);
        // Dropped here, after the lock is released.
        displaced.is_none()
    }

    /// Remove the entry for `key` if present. Absent keys are a no-op.
    pub fn erase(&self, key: &K) {
        let removed = self.lock().remove(key);
        drop(removed);
    }

    /// Entry count at the instant the lock was held. May be stale as soon
    /// as it returns.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Remove every entry. Values are dropped while the lock is held.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let n = entries.len();
        entries.clear();
        drop(entries);
        log::trace!("cleared {} entries", n);
    }

    /// Run `f` with mutable access to the value for `key`, under the lock.
    ///
    /// Returns `false` without calling `f` if the key is absent. This is
    /// the only way to mutate a stored value in place. `f` holds the lock
    /// for its whole duration, so it must be short and must not touch this
    /// map.
    pub fn find_and<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    /// Run `f` with shared access to the value for `key` and return its
    /// result. Works for values that cannot be cloned.
    pub fn find_map<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.lock().get(key).map(f)
    }

    /// Move the value for `key` out of the map and erase the entry.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    /// Like `remove`, but only if `predicate` holds for the stored value.
    ///
    /// The predicate is evaluated under the lock and is not called when
    /// the key is absent. When it returns `false` the entry is untouched.
    pub fn remove_if<P>(&self, key: &K, predicate: P) -> Option<V>
    where
        P: FnOnce(&V) -> bool,
    {
        let mut entries = self.lock();
        if entries.get(key).is_some_and(predicate) {
            entries.remove(key)
        } else {
            None
        }
    }

    /// Direct access to storage. `&mut self` already rules out other
    /// threads, so no locking takes place.
    pub fn get_mut(&mut self) -> &mut M {
        self.entries.get_mut()
    }

    pub fn into_inner(self) -> M {
        self.entries.into_inner()
    }
}

impl<K, V, M> ConcurrentMap<K, V, M>
where
    M: Backing<K, V>,
    V: Clone,
{
    /// Clone of the value for `key`, if present.
    pub fn find_copy(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }
}

impl<K, V, M> Default for ConcurrentMap<K, V, M>
where
    M: Backing<K, V> + Default,
{
    fn default() -> Self {
        Self::from_backing(M::default())
    }
}

impl<K, V, M> FromIterator<(K, V)> for ConcurrentMap<K, V, M>
where
    M: Backing<K, V> + FromIterator<(K, V)>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_backing(iter.into_iter().collect())
    }
}

// Delegates to parking_lot's Debug, which uses try_lock and never blocks.
impl<K, V, M> fmt::Debug for ConcurrentMap<K, V, M>
where
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("entries", &self.entries)
            .finish()
    }
}
