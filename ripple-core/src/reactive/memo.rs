//! Lazy Computed Value Implementation
//!
//! A ComputedValue is a cached derived value that recomputes only when it is
//! read after one of its dependencies changed.
//!
//! # How Computed Values Work
//!
//! 1. On construction the value is dirty; nothing is computed yet.
//!
//! 2. When an upstream node changes, the value is marked dirty. No
//!    comparison is made and nothing propagates further.
//!
//! 3. On the next `get`, a dirty value recomputes and becomes clean. Clean
//!    values are served from the cache.
//!
//! A computed value is terminal: it has no listeners and nothing can depend
//! on it. Since it never compares values, `T` does not need `PartialEq`.

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use super::listener::ListenMode;
use super::value::ValueCell;
use crate::error::{Error, Result};
use crate::graph::{DependencyReceiver, DependencySource, NodeId};

struct Cache<T> {
    /// `None` until the first recompute.
    value: Option<T>,
    dirty: bool,
}

/// A listener-less derived value that recomputes on read.
///
/// # Example
///
/// ```rust
/// use ripple_core::{ComputedValue, Signal};
///
/// let name = Signal::new(String::from("ada"));
/// let shout = {
///     let n = name.clone();
///     ComputedValue::new(move || n.get().to_uppercase(), &[&name]).unwrap()
/// };
///
/// name.set(String::from("grace"));
/// assert_eq!(shout.get(), "GRACE");
/// ```
pub struct ComputedValue<T> {
    id: NodeId,

    recompute: Box<dyn Fn() -> T + Send + Sync>,

    cache: ValueCell<Cache<T>>,
}

impl<T> ComputedValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed value wired to every node in `upstream`.
    ///
    /// Fails with [`Error::NoDependencies`] when `upstream` is empty.
    pub fn new<F>(recompute: F, upstream: &[&dyn DependencySource]) -> Result<Arc<Self>>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        if upstream.is_empty() {
            return Err(Error::NoDependencies);
        }

        let node = Arc::new(Self {
            id: NodeId::new(),
            recompute: Box::new(recompute),
            cache: ValueCell::new(Cache {
                value: None,
                dirty: true,
            }),
        });

        let weak_node = Arc::downgrade(&node);
        let receiver: Weak<dyn DependencyReceiver> = weak_node;
        for source in upstream {
            source.add_dependent(receiver.clone());
        }

        Ok(node)
    }

    /// Get the value's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the current value, recomputing if dirty.
    pub fn get(&self) -> T {
        self.cache.read_or_refresh(
            |cache| match (&cache.value, cache.dirty) {
                (Some(value), false) => Some(value.clone()),
                _ => None,
            },
            |cache| {
                let value = (self.recompute)();
                cache.value = Some(value.clone());
                cache.dirty = false;
                value
            },
        )
    }

    /// Whether the next `get` will recompute.
    pub fn is_dirty(&self) -> bool {
        self.cache.with(|cache| cache.dirty)
    }

    /// Check if the value has been computed at least once.
    pub fn has_value(&self) -> bool {
        self.cache.with(|cache| cache.value.is_some())
    }
}

impl<T> DependencyReceiver for ComputedValue<T>
where
    T: Send + Sync,
{
    fn dependency_changed(&self) {
        self.cache.with_mut(|cache| cache.dirty = true);
    }

    fn trigger_listeners(&self, _mode: ListenMode) {}

    fn has_listener_capability(&self) -> bool {
        false
    }
}

impl<T> Debug for ComputedValue<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.cache.with(|cache| {
            f.debug_struct("ComputedValue")
                .field("id", &self.id)
                .field("value", &cache.value)
                .field("dirty", &cache.dirty)
                .finish()
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
