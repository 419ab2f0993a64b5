//! Value container shared by every node kind.
//!
//! A [`ValueCell`] is a reader/writer-locked slot. Shared reads are
//! recursive: a thread that already holds a read guard can read again even
//! if a writer is queued. Stale caches are refreshed through an upgradable
//! read so that concurrent readers racing on the same stale value run the
//! refresh exactly once.

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// A lock-protected holder for a single value.
#[derive(Default)]
pub struct ValueCell<T> {
    inner: RwLock<T>,
}

impl<T> ValueCell<T> {
    /// Create a new cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Read the value under a shared lock.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read_recursive();
        f(&guard)
    }

    /// Mutate the value under an exclusive lock.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Swap in a new value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.inner.write(), value)
    }

    /// Read through a cache that may need refreshing.
    ///
    /// `fresh` is tried under a shared lock first and returns `Some` when the
    /// cached state can be served as is. Only when it returns `None` is the
    /// lock upgraded; `fresh` is tried again before `refresh` runs because
    /// another reader may have refreshed in between. `refresh` runs under the
    /// exclusive lock and produces the result.
    pub fn read_or_refresh<R>(
        &self,
        fresh: impl Fn(&T) -> Option<R>,
        refresh: impl FnOnce(&mut T) -> R,
    ) -> R {
        if let Some(value) = fresh(&*self.inner.read_recursive()) {
            return value;
        }

        let guard = self.inner.upgradable_read();
        if let Some(value) = fresh(&*guard) {
            return value;
        }

        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        refresh(&mut *guard)
    }
}

impl<T: Clone> ValueCell<T> {
    /// Clone the current value out of the cell.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|value| f.debug_tuple("ValueCell").field(value).finish())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
