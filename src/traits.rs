//! Core traits that decouple wscycle from any specific window manager or
//! transport mechanism.
//!
//! Every concrete backend (i3/sway IPC, the control-socket listener, the
//! signal watcher, a test harness, …) implements one of these traits.  The
//! [`Dispatcher`](crate::dispatcher::Dispatcher) and the
//! [`Daemon`](crate::daemon::Daemon) only depend on these abstractions.

use crate::command::Snapshot;
use crate::ipc::protocol::{Request, Response};
use std::sync::mpsc;

/// Abstraction over a window manager that can report its workspaces,
/// focus a workspace and move the focused workspace between outputs.
///
/// An implementation might talk to i3 or sway via IPC, or it might be a
/// recording stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Query the current outputs and workspaces.
    fn snapshot(&self) -> Result<Snapshot, Self::Error>;

    /// Focus the workspace called `name`.
    fn focus_workspace(&self, name: &str) -> Result<(), Self::Error>;

    /// Move the currently focused workspace to `output`.
    ///
    /// Whether focus follows the workspace is backend specific; callers that
    /// need it should focus the workspace again afterwards.
    fn move_workspace_to_output(&self, output: &str) -> Result<(), Self::Error>;
}

//  Daemon events

/// Everything the daemon loop reacts to.
///
/// Produced by [`EventSource`]s running on their own threads and consumed,
/// strictly in arrival order, by [`Daemon::run`](crate::daemon::Daemon::run).
#[derive(Debug)]
pub enum DaemonEvent {
    /// A workspace gained focus.
    ///
    /// `output` is filled in when the window manager's event payload carries
    /// it; otherwise the daemon resolves it from a fresh snapshot.
    WorkspaceFocused {
        workspace: String,
        output: Option<String>,
    },

    /// Workspaces or outputs were created, destroyed, moved or renamed, or
    /// the event stream reconnected.  The registry must be refreshed.
    Topology,

    /// A control-channel request.  Exactly one [`Response`] must be sent
    /// back through `reply`.
    Request {
        request: Request,
        reply: mpsc::Sender<Response>,
    },

    /// Stop the daemon.  `reason` is only used for logging.
    Shutdown { reason: String },
}

//  Event Source

/// A source of [`DaemonEvent`]s.
///
/// Implementations listen on some transport (the window manager's event
/// subscription, the control socket, process signals, an in-memory channel)
/// and forward what they observe into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted,
///   the sink is closed, or an unrecoverable error occurs.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every event into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<DaemonEvent>) -> Result<(), Self::Error>;
}
