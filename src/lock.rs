use std::cell::Cell;
use std::marker::PhantomData;

use lock_api::{GuardNoSend, RawMutex};

/// The default lock kind: a real mutual-exclusion lock (parking_lot's raw mutex).
///
/// Use this for any pool that may be touched from more than one thread.
pub type MutexLock = parking_lot::RawMutex;

/// A no-op lock kind for single-threaded pools.
///
/// Selecting `NoLock` removes all synchronization from the pool with no other semantic
/// change. The type is deliberately `!Sync`, which makes the pool `!Sync` as well: a pool
/// without a real lock cannot be shared between threads, so the missing synchronization can
/// never be observed.
///
/// Static pools cannot use `NoLock`: a process-wide singleton must be `Sync`.
#[derive(Debug)]
pub struct NoLock {
    /// Keeps the type `!Sync`. A no-op lock must never guard shared state.
    _not_sync: PhantomData<Cell<()>>,
}

// SAFETY: every acquisition trivially succeeds and guards nothing. Sound because the type
// is `!Sync`: no two threads can ever contend for the same instance.
unsafe impl RawMutex for NoLock {
    const INIT: Self = Self {
        _not_sync: PhantomData,
    };

    type GuardMarker = GuardNoSend;

    #[inline]
    fn lock(&self) {}

    #[inline]
    fn try_lock(&self) -> bool {
        true
    }

    #[inline]
    unsafe fn unlock(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_lock_is_reentrant_free() {
        let lock: NoLock = NoLock::INIT;

        lock.lock();
        assert!(lock.try_lock());

        // SAFETY: the lock is a no-op; unlock without a matching lock is harmless.
        unsafe { lock.unlock() };
    }

    #[test]
    fn no_lock_is_not_sync() {
        static_assertions::assert_not_impl_all!(NoLock: Sync);
    }
}
