//! Ripple Core
//!
//! This crate provides the propagation engine for the Ripple reactive
//! signal library. It implements:
//!
//! - Root signals: mutable cells that notify dependents and listeners
//! - Eager computed signals: derived nodes that recompute and diff on change
//! - Lazy computed values: derived, listener-less, recompute-on-read caches
//! - A multi-phase dispatch protocol with sync and async listeners
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: node kinds, listeners, and the value container
//! - `graph`: dependency edges, node identity, and listener dispatch
//! - `error`: the error taxonomy
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use std::sync::Arc;
//!
//! use ripple_core::{ComputedSignal, Listenable, Signal};
//!
//! // Create a signal
//! let count = Signal::new(1);
//!
//! // Create a derived value
//! let doubled = {
//!     let c = count.clone();
//!     ComputedSignal::new(move || c.get() * 2, &[&count]).unwrap()
//! };
//!
//! // Listen to the derived value from another thread
//! let seen = Arc::new(AtomicI32::new(0));
//! let seen_clone = seen.clone();
//! doubled.listen_async(move |value, _| seen_clone.store(value, Ordering::SeqCst));
//!
//! // Update the signal; `set` returns once every listener has run
//! count.set(5);
//! assert_eq!(seen.load(Ordering::SeqCst), 10);
//! ```
//!
//! # Logging
//!
//! The crate emits `tracing` events (`debug` per propagating `set`, `trace`
//! for finer detail) and installs no subscriber.

pub mod error;
pub mod graph;
pub mod reactive;

pub use error::{Error, Result};
pub use graph::{DependencyReceiver, DependencySource, NodeId};
pub use reactive::{
    ComputedSignal, ComputedValue, ListenMode, Listenable, ListenerEvent, ListenerId, Signal,
    ValueCell,
};
