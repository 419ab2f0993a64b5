//! Listeners and the listener registry.
//!
//! A listener is a callback invoked with `(new_value, node)` whenever the
//! node it is attached to dispatches. Listeners are either synchronous (run
//! in registration order on the dispatching thread) or asynchronous (each
//! invocation gets its own task, joined before the triggering `set`
//! returns).
//!
//! Registrations are keyed by a [`ListenerId`]. Unless an explicit id is
//! given, the id is derived from the identity of the [`ListenerEvent`], so
//! the same event object can later be removed with
//! [`Listenable::unlisten`].

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// The callback signature shared by every listener.
pub type ListenerFn<T> = dyn Fn(T, &dyn Listenable<T>) + Send + Sync;

/// Listeners collected for one dispatch.
pub type ListenerBatch<T> = SmallVec<[ListenerEvent<T>; 4]>;

/// Whether a listener runs on the dispatching thread or in its own task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenMode {
    /// Run sequentially, in registration order, on the calling thread.
    Sync,
    /// Run concurrently in a task joined before `set` returns.
    Async,
}

/// Identifier of a listener registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(String);

impl ListenerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ListenerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ListenerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ListenerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A shareable callback object with a stable identity.
///
/// Cloning an event keeps its identity, so a clone can be used to
/// unregister the original.
pub struct ListenerEvent<T> {
    callback: Arc<ListenerFn<T>>,
}

impl<T> ListenerEvent<T> {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(T, &dyn Listenable<T>) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// The id this event registers under when no explicit id is given.
    pub fn id(&self) -> ListenerId {
        ListenerId(format!("listener@{:p}", Arc::as_ptr(&self.callback)))
    }

    /// Invoke the callback.
    pub fn call(&self, value: T, node: &dyn Listenable<T>) {
        (self.callback)(value, node)
    }
}

impl<T> Clone for ListenerEvent<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for ListenerEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerEvent").field(&self.id()).finish()
    }
}

struct ListenerEntry<T> {
    event: ListenerEvent<T>,
    mode: ListenMode,
}

/// Insertion-ordered map from id to listener.
///
/// Overwriting an existing id keeps the original slot. Removal preserves
/// the relative order of the remaining listeners.
pub struct ListenerRegistry<T> {
    entries: RwLock<IndexMap<ListenerId, ListenerEntry<T>>>,
}

impl<T> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Register `event` under `id`, or under the event's own id.
    pub fn register(
        &self,
        event: ListenerEvent<T>,
        mode: ListenMode,
        id: Option<&str>,
    ) -> ListenerId {
        let id = match id {
            Some(id) => ListenerId::new(id),
            None => event.id(),
        };

        let replaced = self
            .entries
            .write()
            .insert(id.clone(), ListenerEntry { event, mode })
            .is_some();

        tracing::trace!(listener = %id, ?mode, replaced, "listener registered");
        id
    }

    /// Remove the listener registered under `id`. Unknown ids are ignored.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.entries.write().shift_remove(id).is_some();
        if removed {
            tracing::trace!(listener = id, "listener removed");
        }
        removed
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Snapshot the listeners of one mode, in registration order.
    ///
    /// The registry lock is released before any callback runs, so listeners
    /// may register or remove listeners without deadlocking.
    pub fn of_mode(&self, mode: ListenMode) -> ListenerBatch<T> {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.mode == mode)
            .map(|entry| entry.event.clone())
            .collect()
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// The capability set shared by nodes that carry listeners.
///
/// Implemented by [`Signal`](crate::Signal) and
/// [`ComputedSignal`](crate::ComputedSignal). A
/// [`ComputedValue`](crate::ComputedValue) has no listeners and does not
/// implement it. Every listener receives the firing node as
/// `&dyn Listenable<T>`.
pub trait Listenable<T>: Send + Sync {
    /// Current value of the node.
    fn get(&self) -> T;

    /// The node's listener registry.
    fn listeners(&self) -> &ListenerRegistry<T>;

    /// Register an explicit callback object.
    ///
    /// `None` stands for an absent callback and fails with
    /// [`Error::MissingListener`], leaving the registry unchanged.
    fn listen_event(
        &self,
        event: Option<&ListenerEvent<T>>,
        mode: ListenMode,
        id: Option<&str>,
    ) -> Result<ListenerId> {
        let event = event.ok_or(Error::MissingListener)?;
        Ok(self.listeners().register(event.clone(), mode, id))
    }

    /// Remove the listener registered under the event's own id.
    ///
    /// Registrations made with an explicit id are not matched.
    fn unlisten(&self, event: &ListenerEvent<T>) {
        self.listeners().remove(event.id().as_str());
    }

    fn unlisten_by_id(&self, id: &str) {
        self.listeners().remove(id);
    }

    fn unlisten_all(&self) {
        self.listeners().clear();
    }

    fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    /// Register a synchronous listener.
    fn listen<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(T, &dyn Listenable<T>) + Send + Sync + 'static,
        Self: Sized,
    {
        self.listeners()
            .register(ListenerEvent::new(callback), ListenMode::Sync, None)
    }

    /// Register an asynchronous listener.
    fn listen_async<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(T, &dyn Listenable<T>) + Send + Sync + 'static,
        Self: Sized,
    {
        self.listeners()
            .register(ListenerEvent::new(callback), ListenMode::Async, None)
    }

    /// Register a synchronous listener under an explicit id.
    fn listen_with_id<F>(&self, id: &str, callback: F) -> ListenerId
    where
        F: Fn(T, &dyn Listenable<T>) + Send + Sync + 'static,
        Self: Sized,
    {
        self.listeners()
            .register(ListenerEvent::new(callback), ListenMode::Sync, Some(id))
    }

    /// Register an asynchronous listener under an explicit id.
    fn listen_async_with_id<F>(&self, id: &str, callback: F) -> ListenerId
    where
        F: Fn(T, &dyn Listenable<T>) + Send + Sync + 'static,
        Self: Sized,
    {
        self.listeners()
            .register(ListenerEvent::new(callback), ListenMode::Async, Some(id))
    }

    /// Register an existing callback object as a synchronous listener.
    fn listen_by_event(&self, event: &ListenerEvent<T>) -> ListenerId
    where
        Self: Sized,
    {
        self.listeners().register(event.clone(), ListenMode::Sync, None)
    }

    /// Register an existing callback object as an asynchronous listener.
    fn listen_async_by_event(&self, event: &ListenerEvent<T>) -> ListenerId
    where
        Self: Sized,
    {
        self.listeners().register(event.clone(), ListenMode::Async, None)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
