//! Errors raised by the pure workspace engine.
//!
//! These are the "nothing to do" conditions of the registry, the history
//! tracker, the cycling engine and the output toggler.  The
//! [`Dispatcher`](crate::dispatcher::Dispatcher) recovers all of them as a
//! no-op with a message; none of them should ever take a process down.

/// A query against the engine state could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No workspace is globally focused (usually a startup race).
    #[error("no focused workspace")]
    NoFocus,

    /// `back` was requested but there is no earlier workspace on the output.
    #[error("no previous workspace recorded on output {output}")]
    NoHistory { output: String },

    /// The output reports zero workspaces.
    #[error("output {output} has no workspaces")]
    NoWorkspaces { output: String },
}
