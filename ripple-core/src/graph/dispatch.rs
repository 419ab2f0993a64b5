//! Listener dispatch for a changed root signal.
//!
//! After dependency state has settled (phase A), a root signal fires its own
//! listeners (phase B) and then the listeners of everything downstream
//! (phase C). All asynchronous work is spawned inside one
//! [`std::thread::scope`], which acts as the task group: the scope does not
//! return until every task spawned in it has finished, so the triggering
//! `set` cannot return early.
//!
//! On the calling thread the order is:
//!
//! 1. spawn one task per async listener of the root,
//! 2. run the root's sync listeners in registration order,
//! 3. spawn one task per dependent to fire async listeners down its subtree,
//! 4. fire sync listeners down each dependent's subtree, depth-first,
//! 5. join.
//!
//! The calling thread never waits for phase B tasks before phase C starts.

use std::thread::{self, Scope};

use super::dependents::LiveDependents;
use crate::reactive::{ListenMode, Listenable, ListenerBatch};

const LISTENER_THREAD: &str = "ripple-listener";
const SUBTREE_THREAD: &str = "ripple-subtree";

/// Everything one dispatch needs, captured after the value swap.
pub(crate) struct Dispatch<'a, T> {
    pub value: &'a T,
    pub node: &'a dyn Listenable<T>,
    pub sync_listeners: ListenerBatch<T>,
    pub async_listeners: ListenerBatch<T>,
    pub dependents: LiveDependents,
}

impl<T> Dispatch<'_, T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run phases B and C and join every task they spawn.
    pub(crate) fn run(self) {
        let Dispatch {
            value,
            node,
            sync_listeners,
            async_listeners,
            dependents,
        } = self;

        if sync_listeners.is_empty() && async_listeners.is_empty() && dependents.is_empty() {
            return;
        }

        thread::scope(|scope| {
            for event in &async_listeners {
                let value = value.clone();
                spawn_or_run(scope, LISTENER_THREAD, move || event.call(value, node));
            }

            for event in &sync_listeners {
                event.call(value.clone(), node);
            }

            for dependent in dependents.iter().filter(|d| d.has_listener_capability()) {
                spawn_or_run(scope, SUBTREE_THREAD, move || {
                    dependent.trigger_listeners(ListenMode::Async)
                });
            }

            for dependent in &dependents {
                dependent.trigger_listeners(ListenMode::Sync);
            }
        });
    }
}

/// Spawn `task` in `scope`. If the OS refuses a new thread the task runs on
/// the calling thread instead, which keeps the join guarantee at the cost
/// of concurrency.
fn spawn_or_run<'scope, 'env, F>(scope: &'scope Scope<'scope, 'env>, name: &str, task: F)
where
    F: FnOnce() + Send + 'scope,
{
    // The builder consumes the closure even on failure, so route it through
    // a slot the fallback path can take it back from.
    let slot = std::sync::Arc::new(parking_lot::Mutex::new(Some(task)));
    let spawned = {
        let slot = slot.clone();
        thread::Builder::new()
            .name(name.to_owned())
            .spawn_scoped(scope, move || {
                let task = slot.lock().take();
                if let Some(task) = task {
                    task();
                }
            })
    };

    if let Err(err) = spawned {
        tracing::warn!(error = %err, thread = name, "failed to spawn task, running inline");
        let task = slot.lock().take();
        if let Some(task) = task {
            task();
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::graph::DependencyReceiver;
    use crate::reactive::{ListenerEvent, ListenerRegistry};

    struct Fixed {
        value: i32,
        listeners: ListenerRegistry<i32>,
    }

    impl Listenable<i32> for Fixed {
        fn get(&self) -> i32 {
            self.value
        }

        fn listeners(&self) -> &ListenerRegistry<i32> {
            &self.listeners
        }
    }

    fn fixed(value: i32) -> Fixed {
        Fixed {
            value,
            listeners: ListenerRegistry::new(),
        }
    }

    #[test]
    fn joins_async_listeners_before_returning() {
        let node = fixed(3);
        let done = Arc::new(AtomicI32::new(0));

        let async_listeners: ListenerBatch<i32> = (0..4)
            .map(|_| {
                let done = done.clone();
                ListenerEvent::new(move |v: i32, _: &dyn Listenable<i32>| {
                    thread::sleep(Duration::from_millis(20));
                    done.fetch_add(v, Ordering::SeqCst);
                })
            })
            .collect();

        Dispatch {
            value: &3,
            node: &node,
            sync_listeners: ListenerBatch::new(),
            async_listeners,
            dependents: LiveDependents::new(),
        }
        .run();

        assert_eq!(done.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn listeners_receive_the_firing_node() {
        let node = fixed(9);
        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();

        let mut sync_listeners = ListenerBatch::new();
        sync_listeners.push(ListenerEvent::new(move |_: i32, node: &dyn Listenable<i32>| {
            seen_clone.store(node.get(), Ordering::SeqCst);
        }));

        Dispatch {
            value: &1,
            node: &node,
            sync_listeners,
            async_listeners: ListenerBatch::new(),
            dependents: LiveDependents::new(),
        }
        .run();

        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    /// A dependent whose sync listeners log a marker.
    struct Downstream {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl DependencyReceiver for Downstream {
        fn dependency_changed(&self) {}

        fn trigger_listeners(&self, mode: ListenMode) {
            if mode == ListenMode::Sync {
                self.log.lock().push("downstream sync");
            }
        }
    }

    #[test]
    fn downstream_sync_does_not_wait_for_root_async() {
        let node = fixed(0);
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut async_listeners = ListenerBatch::new();
        {
            let log = log.clone();
            async_listeners.push(ListenerEvent::new(move |_: i32, _: &dyn Listenable<i32>| {
                thread::sleep(Duration::from_millis(150));
                log.lock().push("root async");
            }));
        }

        let mut dependents = LiveDependents::new();
        dependents.push(Arc::new(Downstream { log: log.clone() }) as Arc<dyn DependencyReceiver>);

        Dispatch {
            value: &1,
            node: &node,
            sync_listeners: ListenerBatch::new(),
            async_listeners,
            dependents,
        }
        .run();

        assert_eq!(*log.lock(), vec!["downstream sync", "root async"]);
    }

    #[test]
    fn spawn_or_run_executes_task() {
        let ran = AtomicI32::new(0);
        thread::scope(|scope| {
            spawn_or_run(scope, "test", || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        });
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
