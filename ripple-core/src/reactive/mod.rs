//! Reactive Nodes
//!
//! This module implements the three node kinds of the propagation engine
//! and the pieces they share.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a mutable cell set directly by the embedder. Every
//! propagation starts with a `set` on a signal.
//!
//! ## Computed Signals
//!
//! A [`ComputedSignal`] derives its value from upstream nodes. It recomputes
//! eagerly when an upstream node changes, and only propagates further if its
//! own value changed. It carries listeners and can itself be depended on.
//!
//! ## Computed Values
//!
//! A [`ComputedValue`] is a terminal, listener-less derived value. Upstream
//! changes only mark it dirty; it recomputes on the next read.
//!
//! ## Listeners
//!
//! Signals and computed signals implement [`Listenable`]. Listeners are
//! synchronous or asynchronous; see [`ListenMode`].
//!
//! # Implementation Notes
//!
//! Nodes are shared through `Arc`. Upstream nodes hold weak edges to their
//! dependents, and computed nodes reach their upstream nodes only through
//! the handles captured by their recompute closures, so the ownership graph
//! has no cycles. There is no global registry: each node owns its own
//! state.

mod computed;
mod listener;
mod memo;
mod signal;
mod value;

pub use computed::ComputedSignal;
pub use listener::{
    ListenMode, Listenable, ListenerBatch, ListenerEvent, ListenerFn, ListenerId, ListenerRegistry,
};
pub use memo::ComputedValue;
pub use signal::Signal;
pub use value::ValueCell;
