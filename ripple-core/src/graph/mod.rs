//! Dependency Graph
//!
//! This module holds the graph plumbing shared by every node kind: node
//! identity, downstream edges, and the listener dispatch that follows a
//! change.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph wired once, top-down, at
//! construction time:
//!
//! - Sources (signals and computed signals) keep an ordered list of weak
//!   edges to their dependents.
//! - Receivers (computed signals and computed values) are notified through
//!   those edges.
//!
//! Edges are never removed. Cycles are a caller error and are not detected.
//!
//! # Propagation Phases
//!
//! A change propagates in two passes. Phase A walks the edges depth-first
//! and settles every cached value and dirty flag. Only then do phases B and
//! C fire listeners; a root signal joins every task they spawn before its
//! `set` returns.

mod dependents;
mod dispatch;
mod node;

pub use dependents::{DependencyReceiver, DependencySource, Dependents, LiveDependents};
pub(crate) use dispatch::Dispatch;
pub use node::NodeId;
