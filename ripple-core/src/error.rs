//! Error types for the propagation engine.
//!
//! Every failure is local and returned synchronously to the caller that made
//! the offending call. Nothing is surfaced through listeners.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A computed node was built without any upstream node to depend on.
    #[error("computed node requires at least one upstream dependency")]
    NoDependencies,

    /// A listener registration was attempted without a callback.
    #[error("listener is null")]
    MissingListener,
}

pub type Result<T> = std::result::Result<T, Error>;
