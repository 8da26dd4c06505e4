//! guarded-map: a thread-safe key-value map where every operation runs
//! under one exclusive lock, and no reference to a stored value ever
//! escapes that lock.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: the simplest correct shared map. One lock, one store, every
//!   operation atomic with respect to every other (linearizable at
//!   operation granularity).
//! - Layers:
//!   - Backing<K, V>: plain single-threaded storage. `BTreeMap` (ordered,
//!     the default) and `hashbrown::HashMap` (hashed, custom hasher).
//!   - ConcurrentMap<K, V, M>: wraps a `Backing` in a `parking_lot::Mutex`
//!     and exposes copy-out reads, callback mutation and extraction.
//!   - DebugReentrancy: thread-aware detector that turns a callback
//!     re-entering its own map into a panic in debug builds.
//!
//! Access rules
//! - `find_copy` clones the value out; only exists when `V: Clone`.
//! - `find_and` / `find_map` run a caller closure on the stored value
//!   while the lock is held. This is the only in-place access.
//! - `remove` / `remove_if` move the value out, so move-only values work.
//! - `insert` takes the value by move and overwrites; it reports whether
//!   the key was fresh.
//!
//! Constraints
//! - Thread-safe: `Send + Sync` when the store is `Send`. Share by
//!   reference (scoped threads) or put it in an `Arc`.
//! - Blocking: every call blocks until the lock is free. No fairness, no
//!   timeouts, no cancellation.
//! - No poisoning: a panicking callback releases the lock during unwind;
//!   the entry keeps whatever state the callback left behind.
//!
//! Reentrancy policy
//! - Callbacks (`find_and`, `find_map`, `remove_if`'s predicate, and
//!   `K`/`V` comparison or clone impls) must not call into the same map.
//!   The lock is not reentrant. In debug builds the second entry panics
//!   with "reentrancy detected" before it can block; in release builds it
//!   deadlocks.
//! - Values displaced by `insert` or `erase` are dropped after the lock is
//!   released, so a `Drop` impl may touch the map. `clear` drops under the
//!   lock.
//!
//! Notes and non-goals
//! - No lock-free paths, sharding, persistence, iteration or multi-key
//!   transactions.
//! - `len()` is a point-in-time snapshot and may be stale on return.

mod backing;
mod concurrent_map;
mod reentrancy;

// Public surface
pub use backing::Backing;
pub use concurrent_map::{ConcurrentHashMap, ConcurrentMap};
pub use reentrancy::{DebugReentrancy, ReentrancyGuard};
