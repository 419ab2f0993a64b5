//! Dependency edges.
//!
//! A node that others can depend on is a [`DependencySource`]; a node that
//! reacts to upstream changes is a [`DependencyReceiver`]. Sources keep their
//! receivers in a [`Dependents`] list of weak references: ownership flows
//! from the embedder to every node directly, never through the graph.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::reactive::ListenMode;

/// Inline capacity for edge lists. Most nodes have a handful of dependents.
const INLINE_EDGES: usize = 4;

/// A node that can be notified by its upstream nodes.
pub trait DependencyReceiver: Send + Sync {
    /// Phase A notification: an upstream value changed.
    ///
    /// Runs synchronously and depth-first before any listener fires.
    fn dependency_changed(&self);

    /// Phase B/C notification: fire this node's listeners of the given mode,
    /// then recurse into its own dependents with the same mode.
    fn trigger_listeners(&self, mode: ListenMode);

    /// Whether [`trigger_listeners`](Self::trigger_listeners) can ever do
    /// anything. Terminal nodes without listeners return `false` so the
    /// dispatcher does not spawn tasks for them.
    fn has_listener_capability(&self) -> bool {
        true
    }
}

/// A node that other nodes can depend on.
pub trait DependencySource: Send + Sync {
    /// Attach a downstream receiver. Edges are never removed.
    fn add_dependent(&self, receiver: Weak<dyn DependencyReceiver>);
}

impl<S> DependencySource for Arc<S>
where
    S: DependencySource + ?Sized,
{
    fn add_dependent(&self, receiver: Weak<dyn DependencyReceiver>) {
        (**self).add_dependent(receiver);
    }
}

/// Snapshot of live receivers, in registration order.
pub type LiveDependents = SmallVec<[Arc<dyn DependencyReceiver>; INLINE_EDGES]>;

/// Append-only ordered list of downstream edges.
#[derive(Default)]
pub struct Dependents {
    edges: RwLock<SmallVec<[Weak<dyn DependencyReceiver>; INLINE_EDGES]>>,
}

impl Dependents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edge.
    pub fn push(&self, receiver: Weak<dyn DependencyReceiver>) {
        self.edges.write().push(receiver);
    }

    /// Upgrade every edge whose receiver is still alive.
    ///
    /// Edges to dropped receivers are skipped, not removed.
    pub fn live(&self) -> LiveDependents {
        let edges = self.edges.read();
        let live: LiveDependents = edges.iter().filter_map(Weak::upgrade).collect();
        if live.len() < edges.len() {
            tracing::trace!(
                dropped = edges.len() - live.len(),
                "skipping edges to dropped dependents"
            );
        }
        live
    }

    /// Number of registered edges, including edges to dropped receivers.
    pub fn len(&self) -> usize {
        self.edges.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.read().is_empty()
    }

    /// Phase A: notify every live dependent, in registration order.
    pub fn notify_changed(&self) {
        for dependent in self.live() {
            dependent.dependency_changed();
        }
    }
}

impl std::fmt::Debug for Dependents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependents")
            .field("len", &self.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        triggered: AtomicI32,
    }

    impl DependencyReceiver for Recorder {
        fn dependency_changed(&self) {
            self.log.lock().push(self.name);
        }

        fn trigger_listeners(&self, _mode: ListenMode) {
            self.triggered.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            log: log.clone(),
            triggered: AtomicI32::new(0),
        })
    }

    #[test]
    fn notifies_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recorder("first", &log);
        let second = recorder("second", &log);
        let third = recorder("third", &log);

        let dependents = Dependents::new();
        for r in [&second, &first, &third] {
            let weak: Weak<dyn DependencyReceiver> = Arc::downgrade(r) as Weak<Recorder>;
            dependents.push(weak);
        }

        dependents.notify_changed();
        assert_eq!(*log.lock(), vec!["second", "first", "third"]);
    }

    #[test]
    fn dropped_receivers_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let kept = recorder("kept", &log);
        let dropped = recorder("dropped", &log);

        let dependents = Dependents::new();
        dependents.push(Arc::downgrade(&kept) as Weak<dyn DependencyReceiver>);
        dependents.push(Arc::downgrade(&dropped) as Weak<dyn DependencyReceiver>);
        drop(dropped);

        assert_eq!(dependents.len(), 2);
        assert_eq!(dependents.live().len(), 1);

        dependents.notify_changed();
        assert_eq!(*log.lock(), vec!["kept"]);
    }

    #[test]
    fn empty_list() {
        let dependents = Dependents::new();
        assert!(dependents.is_empty());
        assert!(dependents.live().is_empty());
        dependents.notify_changed();
    }
}
