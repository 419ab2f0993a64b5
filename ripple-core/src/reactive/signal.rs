//! Root Signal Implementation
//!
//! A Signal is the mutable entry point of every propagation. It holds a
//! value set directly by the embedder, a listener registry, and weak edges
//! to the computed nodes built on top of it.
//!
//! # How a Set Propagates
//!
//! When `set` actually changes the value (or is forced):
//!
//! 1. A per-signal set lock is taken for the whole operation.
//!
//! 2. The new value is swapped in; the previous one is kept for the return.
//!
//! 3. Phase A: every dependent is told its dependency changed. This settles
//!    cached values and dirty flags for the whole downstream subgraph before
//!    any listener anywhere runs.
//!
//! 4. Phases B and C: this signal's listeners fire, then the listeners of
//!    every downstream node (see [`crate::graph`]). Async listeners run in
//!    their own tasks.
//!
//! 5. The call returns only once every task it spawned has finished.
//!
//! # Read-Modify-Write
//!
//! `get` and `set` are locked independently, so `s.set(s.get() + 1)` from
//! concurrent callers can lose updates. [`Signal::set_from_value`] holds the
//! set lock across the read and the write and is the safe way to do it.
//!
//! # Re-entrancy
//!
//! The set lock is not re-entrant. A listener must not call `set` or
//! `set_from_value` on the signal it is attached to; setting other signals
//! from a listener is fine.

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::listener::{ListenMode, Listenable, ListenerRegistry};
use super::value::ValueCell;
use crate::graph::{Dependents, DependencyReceiver, DependencySource, Dispatch, NodeId};

/// A mutable reactive cell.
///
/// Signals are shared through `Arc`; constructors return `Arc<Signal<T>>`.
///
/// # Example
///
/// ```rust
/// use ripple_core::{Listenable, Signal};
///
/// let count = Signal::new(0);
/// count.listen(|value, _| println!("count is now {value}"));
///
/// assert_eq!(count.set(5), 0);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T> {
    id: NodeId,

    value: ValueCell<T>,

    /// Serializes `set` and `set_from_value` for their whole duration.
    set_lock: Mutex<()>,

    listeners: ListenerRegistry<T>,

    dependents: Dependents,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::new(),
            value: ValueCell::new(value),
            set_lock: Mutex::new(()),
            listeners: ListenerRegistry::new(),
            dependents: Dependents::new(),
        })
    }

    /// Create a new signal holding `T::default()`.
    pub fn new_default() -> Arc<Self>
    where
        T: Default,
    {
        Self::new(T::default())
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Set a new value and propagate it. Returns the previous value.
    ///
    /// Setting a value equal to the current one does nothing.
    pub fn set(&self, value: T) -> T {
        self.set_with(value, false)
    }

    /// Set a new value and propagate it even if it equals the current one.
    pub fn set_forced(&self, value: T) -> T {
        self.set_with(value, true)
    }

    /// Set a new value, optionally bypassing the equality short-circuit.
    pub fn set_with(&self, value: T, force: bool) -> T {
        let _guard = self.set_lock.lock();
        self.store(value, force)
    }

    /// Atomically read the current value, transform it, and set the result.
    ///
    /// Returns the previous value. Concurrent callers never lose updates.
    pub fn set_from_value<F>(&self, f: F) -> T
    where
        F: FnOnce(T) -> T,
    {
        let _guard = self.set_lock.lock();
        let next = f(self.value.get());
        self.store(next, false)
    }

    /// Number of computed nodes wired to this signal.
    pub fn dependent_count(&self) -> usize {
        self.dependents.len()
    }

    /// Swap and propagate. Must be called with the set lock held.
    fn store(&self, value: T, force: bool) -> T {
        if !force && self.value.with(|current| *current == value) {
            tracing::trace!(node = %self.id, "set with unchanged value ignored");
            return value;
        }

        let previous = self.value.replace(value.clone());

        let dependents = self.dependents.live();
        tracing::debug!(
            node = %self.id,
            force,
            dependents = dependents.len(),
            listeners = self.listeners.len(),
            "propagating signal change"
        );

        for dependent in &dependents {
            dependent.dependency_changed();
        }

        Dispatch {
            value: &value,
            node: self,
            sync_listeners: self.listeners.of_mode(ListenMode::Sync),
            async_listeners: self.listeners.of_mode(ListenMode::Async),
            dependents,
        }
        .run();

        previous
    }
}

impl<T> Listenable<T> for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn get(&self) -> T {
        Signal::get(self)
    }

    fn listeners(&self) -> &ListenerRegistry<T> {
        &self.listeners
    }
}

impl<T> DependencySource for Signal<T>
where
    T: Send + Sync,
{
    fn add_dependent(&self, receiver: Weak<dyn DependencyReceiver>) {
        self.dependents.push(receiver);
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.get())
            .field("listener_count", &self.listeners.len())
            .field("dependent_count", &self.dependents.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
