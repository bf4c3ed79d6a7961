//! The listening daemon's state and event loop.
//!
//! [`Daemon`] owns the [`Registry`] and the [`HistoryTracker`] and is the
//! only place either is mutated.  Every input (focus changes, topology
//! changes, control requests, shutdown) arrives as a [`DaemonEvent`] on one
//! channel and is handled to completion before the next one, so history
//! updates are applied in the order the window manager reported them.

use crate::history::HistoryTracker;
use crate::ipc::client::ControlError;
use crate::ipc::protocol::{Request, Response};
use crate::registry::Registry;
use crate::signals::SignalError;
use crate::traits::{DaemonEvent, WindowManager};
use log::{debug, info, warn};
use std::sync::mpsc;

/// Errors that prevent the daemon from starting.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("window manager error: {0}")]
    WindowManager(String),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Long-running tracker of per-output focus history.
pub struct Daemon<W: WindowManager> {
    wm: W,
    registry: Registry,
    history: HistoryTracker,
    seeded: bool,
}

impl<W: WindowManager> Daemon<W> {
    /// Create a daemon keeping `depth` history entries per output.
    pub fn new(wm: W, depth: usize) -> Self {
        Self {
            wm,
            registry: Registry::new(),
            history: HistoryTracker::new(depth),
            seeded: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    /// Take the initial snapshot.
    ///
    /// If the window manager does not answer yet, the daemon still starts:
    /// the first successful refresh (at the latest the resync the event
    /// stream sends once it connects) takes its place.
    pub fn start(&mut self) {
        info!("keeping up to {} workspaces per output", self.history.depth());
        if !self.refresh() {
            warn!("window manager not reachable yet, waiting for its events");
        }
    }

    /// Seed the history with the workspace focused right now, so the first
    /// `back` after a switch has an answer.
    fn seed(&mut self) {
        if let (Ok(output), Ok(workspace)) = (
            self.registry.current_output(),
            self.registry.focused_workspace(),
        ) {
            info!(
                "tracking {} output(s): {}",
                self.registry.output_count(),
                self.registry.outputs().collect::<Vec<_>>().join(", ")
            );
            self.history.record_focus(output, workspace);
            self.seeded = true;
        }
    }

    /// Re-query the window manager.  On failure the previous registry is
    /// kept, so a transient IPC error never loses state.
    fn refresh(&mut self) -> bool {
        let snapshot = match self.wm.snapshot() {
            Ok(s) => s,
            Err(e) => {
                warn!("refresh failed, keeping previous state: {}", e);
                return false;
            }
        };
        let change = self.registry.refresh(&snapshot);
        for output in &change.removed {
            info!("output removed: {}", output);
            self.history.forget_output(output);
        }
        if !self.seeded {
            self.seed();
        } else {
            for output in &change.added {
                info!("output added: {}", output);
            }
        }
        true
    }

    /// Record that `workspace` gained focus.
    fn on_focus(&mut self, workspace: &str, output: Option<&str>) {
        self.refresh();
        let output = match output.or_else(|| self.registry.output_of(workspace)) {
            Some(o) => o.to_string(),
            None => {
                debug!("focused workspace {} already gone, ignoring", workspace);
                return;
            }
        };
        self.history.record_focus(&output, workspace);
    }

    /// Answer one control request.
    pub fn respond(&mut self, request: &Request) -> Response {
        match request {
            Request::PreviousOn { output } => {
                // Staleness is judged against the state right now.
                self.refresh();
                match self.history.previous_on(output, &self.registry) {
                    Ok(workspace) => Response::Previous {
                        workspace: workspace.to_string(),
                    },
                    Err(e) => {
                        debug!("{}", e);
                        Response::NoHistory {
                            output: output.clone(),
                        }
                    }
                }
            }
            Request::Status => Response::Status {
                history: self.history.snapshot(),
            },
            Request::Ping => Response::Pong,
        }
    }

    /// Handle one event.  Returns `false` when the daemon should stop.
    pub fn handle(&mut self, event: DaemonEvent) -> bool {
        match event {
            DaemonEvent::WorkspaceFocused { workspace, output } => {
                self.on_focus(&workspace, output.as_deref());
            }
            DaemonEvent::Topology => {
                self.refresh();
            }
            DaemonEvent::Request { request, reply } => {
                let response = self.respond(&request);
                if reply.send(response).is_err() {
                    debug!("requester went away before the reply");
                }
            }
            DaemonEvent::Shutdown { reason } => {
                info!("shutting down: {}", reason);
                return false;
            }
        }
        true
    }

    /// Process events until a shutdown event arrives or every source is gone.
    pub fn run(&mut self, events: mpsc::Receiver<DaemonEvent>) {
        info!("wscycle daemon running");
        for event in events {
            if !self.handle(event) {
                return;
            }
        }
        info!("all event sources closed, exiting");
    }
}
