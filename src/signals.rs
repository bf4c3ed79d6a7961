//! Termination signals as a [`DaemonEvent`] source.
//!
//! The daemon must stop cleanly on SIGINT / SIGTERM / SIGHUP so it can remove
//! its control socket.  Rather than running code inside an asynchronous
//! signal handler, the signals are blocked and a dedicated thread picks them
//! up synchronously with `sigwait`, turning each into
//! [`DaemonEvent::Shutdown`].
//!
//! [`SignalWatcher::install`] must run on the main thread **before** any
//! other thread is spawned: the signal mask is inherited, and a thread that
//! does not block the signals would get them delivered with the default
//! (terminating) disposition instead.

use crate::traits::{DaemonEvent, EventSource};
use log::{debug, info};
use nix::sys::signal::{SigSet, Signal};
use std::sync::mpsc;

/// Signals that stop the daemon.
pub const TERMINATION_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

/// Errors from signal mask manipulation.
#[derive(Debug, thiserror::Error)]
#[error("signal error: {0}")]
pub struct SignalError(#[from] nix::Error);

/// Waits for termination signals and reports them as shutdown events.
pub struct SignalWatcher {
    set: SigSet,
}

impl SignalWatcher {
    /// Block [`TERMINATION_SIGNALS`] in the calling thread.
    pub fn install() -> Result<Self, SignalError> {
        Self::for_signals(&TERMINATION_SIGNALS)
    }

    /// Block `signals` in the calling thread and watch for them.
    pub fn for_signals(signals: &[Signal]) -> Result<Self, SignalError> {
        let mut set = SigSet::empty();
        for sig in signals {
            set.add(*sig);
        }
        set.thread_block()?;
        debug!("blocked {:?}", signals);
        Ok(Self { set })
    }
}

impl EventSource for SignalWatcher {
    type Error = SignalError;

    /// Wait for the first watched signal, forward it and return.
    fn run(&mut self, sink: mpsc::Sender<DaemonEvent>) -> Result<(), Self::Error> {
        let sig = self.set.wait()?;
        info!("received {:?}", sig);
        let _ = sink.send(DaemonEvent::Shutdown {
            reason: format!("received {:?}", sig),
        });
        Ok(())
    }
}
