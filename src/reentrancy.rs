//! Debug-only reentrancy guard.
//!
//! Thread-aware structure to detect a thread calling back into a locked
//! data structure while it already holds that structure's lock. In debug
//! builds, `check` panics when the calling thread is the current holder.
//! In release builds, this compiles to a zero-cost no-op and reentrant
//! misuse deadlocks on the underlying lock.

#[cfg(not(debug_assertions))]
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use core::sync::atomic::{AtomicUsize, Ordering};

/// Per-instance holder tracker. Embed this next to a lock and call
/// `check()` before blocking on it, then `hold()` once it is acquired.
#[derive(Debug)]
pub struct DebugReentrancy {
    // Token of the thread currently inside the critical section, 0 if none.
    #[cfg(debug_assertions)]
    holder: AtomicUsize,
}

/// Nonzero token unique among live threads: the address of a thread-local.
#[cfg(debug_assertions)]
fn thread_token() -> usize {
    thread_local! {
        static TOKEN: u8 = const { 0 };
    }
    TOKEN.with(|t| t as *const u8 as usize)
}

impl DebugReentrancy {
    /// Create a new reentrancy tracker. Const so it can be a field default.
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            holder: AtomicUsize::new(0),
        }
    }

    /// Fail fast if the calling thread already holds the guarded section.
    ///
    /// Must be called before blocking on the lock. Other threads holding
    /// the section are not reentrancy and pass through.
    #[inline]
    pub fn check(&self) {
        #[cfg(debug_assertions)]
        {
            // Only this thread ever stores its own token, so Relaxed suffices.
            if self.holder.load(Ordering::Relaxed) == thread_token() {
                log::error!("reentrant call into a locked map from its own callback");
                panic!("reentrancy detected: nested entry into data structure");
            }
        }
    }

    /// Mark the calling thread as holder until the returned guard drops.
    ///
    /// Call only after the lock has been acquired.
    #[inline]
    pub fn hold(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let prev = self.holder.swap(thread_token(), Ordering::Relaxed);
            debug_assert_eq!(prev, 0, "holder mark set while lock was free");
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }

    /// Check then hold in one step, for callers that own the section
    /// exclusively and never block (single-threaded use, tests).
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        self.check();
        self.hold()
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::hold`. Drop it before the
/// lock it accompanies is released.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.owner.holder.swap(0, Ordering::Relaxed);
            debug_assert_eq!(prev, thread_token());
        }
    }
}
