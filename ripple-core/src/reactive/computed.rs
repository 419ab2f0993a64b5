//! Eager Computed Signal Implementation
//!
//! A ComputedSignal is a derived node that recomputes as soon as an
//! upstream node reports a change, and only propagates further if its value
//! actually changed. This lets a diamond-shaped graph skip downstream work
//! when an upstream change does not alter a derived value.
//!
//! # Two Caching Layers
//!
//! On top of the eager recompute, the node keeps a staleness flag that the
//! next `get` consults:
//!
//! - construction runs the recompute function once to seed the cache and
//!   leaves the node stale,
//! - a dependency change that alters the value stores it and leaves the node
//!   stale again,
//! - `get` on a stale node recomputes once more and clears the flag.
//!
//! The value is always correct, but the recompute function can run more
//! often than strictly necessary. Recompute functions are expected to be
//! pure, so this is only visible through side effects they should not have.
//!
//! # Listeners
//!
//! A computed signal carries listeners just like a root signal. They fire
//! whenever an ancestor's `set` dispatches through this node, with the value
//! read at that moment.

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use super::listener::{ListenMode, Listenable, ListenerRegistry};
use super::value::ValueCell;
use crate::error::{Error, Result};
use crate::graph::{Dependents, DependencyReceiver, DependencySource, NodeId};

/// Cached value plus the staleness flag consulted by `get`.
///
/// The value is seeded at construction so that the first upstream change
/// has a baseline to diff against.
struct Cache<T> {
    value: T,
    stale: bool,
}

/// A derived node that recomputes eagerly and diffs its output.
///
/// # Example
///
/// ```rust
/// use ripple_core::{ComputedSignal, Signal};
///
/// let price = Signal::new(10);
/// let quantity = Signal::new(3);
///
/// let total = {
///     let (p, q) = (price.clone(), quantity.clone());
///     ComputedSignal::new(move || p.get() * q.get(), &[&price, &quantity]).unwrap()
/// };
///
/// quantity.set(4);
/// assert_eq!(total.get(), 40);
/// ```
pub struct ComputedSignal<T> {
    id: NodeId,

    recompute: Box<dyn Fn() -> T + Send + Sync>,

    cache: ValueCell<Cache<T>>,

    listeners: ListenerRegistry<T>,

    dependents: Dependents,
}

impl<T> ComputedSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a computed signal wired to every node in `upstream`.
    ///
    /// The recompute function runs once here to seed the cache, and the node
    /// starts out stale. Fails with [`Error::NoDependencies`] when
    /// `upstream` is empty.
    pub fn new<F>(recompute: F, upstream: &[&dyn DependencySource]) -> Result<Arc<Self>>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        if upstream.is_empty() {
            return Err(Error::NoDependencies);
        }

        let seed = recompute();
        let node = Arc::new(Self {
            id: NodeId::new(),
            recompute: Box::new(recompute),
            cache: ValueCell::new(Cache {
                value: seed,
                stale: true,
            }),
            listeners: ListenerRegistry::new(),
            dependents: Dependents::new(),
        });

        let weak_node = Arc::downgrade(&node);
        let receiver: Weak<dyn DependencyReceiver> = weak_node;
        for source in upstream {
            source.add_dependent(receiver.clone());
        }

        tracing::trace!(node = %node.id, upstream = upstream.len(), "computed signal wired");
        Ok(node)
    }

    /// Get the node's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the current value, recomputing first if the node is stale.
    pub fn get(&self) -> T {
        self.cache.read_or_refresh(
            |cache| (!cache.stale).then(|| cache.value.clone()),
            |cache| {
                let value = (self.recompute)();
                cache.value = value.clone();
                cache.stale = false;
                value
            },
        )
    }

    /// Whether the next `get` will recompute.
    pub fn is_stale(&self) -> bool {
        self.cache.with(|cache| cache.stale)
    }

    /// Number of computed nodes wired to this one.
    pub fn dependent_count(&self) -> usize {
        self.dependents.len()
    }
}

impl<T> DependencyReceiver for ComputedSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn dependency_changed(&self) {
        let value = (self.recompute)();

        let changed = self.cache.with_mut(|cache| {
            if cache.value == value {
                return false;
            }
            cache.value = value;
            cache.stale = true;
            true
        });

        tracing::trace!(node = %self.id, changed, "computed signal recomputed");
        if changed {
            self.dependents.notify_changed();
        }
    }

    fn trigger_listeners(&self, mode: ListenMode) {
        let listeners = self.listeners.of_mode(mode);
        if !listeners.is_empty() {
            let value = self.get();
            for event in &listeners {
                event.call(value.clone(), self);
            }
        }

        for dependent in self.dependents.live() {
            dependent.trigger_listeners(mode);
        }
    }
}

impl<T> DependencySource for ComputedSignal<T>
where
    T: Send + Sync,
{
    fn add_dependent(&self, receiver: Weak<dyn DependencyReceiver>) {
        self.dependents.push(receiver);
    }
}

impl<T> Listenable<T> for ComputedSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn get(&self) -> T {
        ComputedSignal::get(self)
    }

    fn listeners(&self) -> &ListenerRegistry<T> {
        &self.listeners
    }
}

impl<T> Debug for ComputedSignal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.cache.with(|cache| cache.value.clone());
        f.debug_struct("ComputedSignal")
            .field("id", &self.id)
            .field("value", &value)
            .field("stale", &self.is_stale())
            .field("listener_count", &self.listeners.len())
            .field("dependent_count", &self.dependents.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
