//! Unix-socket [`EventSource`] implementation: the daemon side of the
//! control channel.
//!
//! Binds a Unix stream socket and accepts one connection at a time.  Each
//! connection sends one JSON-encoded [`Request`] line; the request is
//! forwarded to the daemon loop together with a reply channel, and the
//! daemon's [`Response`] is written back as one JSON line.
//!
//! # Wire format
//!
//! ```json
//! {"PreviousOn":{"output":"eDP-1"}}
//! "Status"
//! "Ping"
//! ```

use crate::ipc::client::{ControlClient, ControlError};
use crate::ipc::protocol::{Request, Response};
use crate::traits::{DaemonEvent, EventSource};
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// An [`EventSource`] that serves control requests on a Unix stream socket.
///
/// Construct with [`ControlListener::bind`], which also makes sure only one
/// daemon owns the socket.
pub struct ControlListener {
    path: PathBuf,
    listener: UnixListener,
    timeout: Duration,
}

/// Removes the control socket file when dropped.
///
/// The listener itself runs on a thread that is never joined, so the daemon
/// keeps one of these on its main thread.
#[derive(Debug)]
pub struct SocketCleanup {
    path: PathBuf,
}

impl Drop for SocketCleanup {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed {}", self.path.display()),
            Err(e) => warn!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}

impl ControlListener {
    /// Bind the control socket at `path`.
    ///
    /// If the socket file already exists and something accepts connections
    /// on it, binding fails with [`ControlError::AlreadyRunning`], whether or
    /// not the peer answers in time.  Only a socket file nobody listens on
    /// is left over from a dead daemon and is removed.
    ///
    /// `timeout` bounds both the wait for the daemon loop's reply and the
    /// reads and writes on each client connection.
    pub fn bind(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, ControlError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            match ControlClient::new(&path, timeout).ping() {
                Err(ControlError::NotRunning { source, .. }) => {
                    warn!("removing stale socket {} ({})", path.display(), source);
                    std::fs::remove_file(&path)?;
                }
                Ok(()) => return Err(ControlError::AlreadyRunning(path.display().to_string())),
                Err(e) => {
                    warn!("{} is in use by an unresponsive peer: {}", path.display(), e);
                    return Err(ControlError::AlreadyRunning(path.display().to_string()));
                }
            }
        }

        let listener = UnixListener::bind(&path)?;
        info!("listening on {}", path.display());
        Ok(Self {
            path,
            listener,
            timeout,
        })
    }

    /// A guard that deletes the socket file when dropped.
    pub fn cleanup_guard(&self) -> SocketCleanup {
        SocketCleanup {
            path: self.path.clone(),
        }
    }

    /// Serve one connection.  Returns `false` once the daemon loop is gone.
    fn serve(&self, stream: UnixStream, sink: &mpsc::Sender<DaemonEvent>) -> bool {
        if let Err(e) = stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.timeout)))
        {
            error!("failed to configure client socket: {}", e);
            return true;
        }

        let mut line = String::new();
        if let Err(e) = BufReader::new(&stream).read_line(&mut line) {
            error!("read error: {}", e);
            return true;
        }
        if line.trim().is_empty() {
            debug!("client sent nothing");
            return true;
        }

        let (response, keep_going) = match serde_json::from_str::<Request>(line.trim()) {
            Ok(request) => {
                debug!("received {:?}", request);
                let (reply, replies) = mpsc::channel();
                if sink.send(DaemonEvent::Request { request, reply }).is_err() {
                    info!("sink closed, shutting down");
                    return false;
                }
                match replies.recv_timeout(self.timeout) {
                    Ok(response) => (response, true),
                    Err(mpsc::RecvTimeoutError::Timeout) => (
                        Response::Error {
                            message: format!("daemon did not answer within {:?}", self.timeout),
                        },
                        true,
                    ),
                    Err(mpsc::RecvTimeoutError::Disconnected) => (
                        Response::Error {
                            message: "daemon is shutting down".into(),
                        },
                        false,
                    ),
                }
            }
            Err(e) => {
                error!("bad request: {} ({})", line.trim(), e);
                (
                    Response::Error {
                        message: format!("bad request: {}", e),
                    },
                    true,
                )
            }
        };

        if let Err(e) = write_response(&stream, &response) {
            error!("write error: {}", e);
        }
        keep_going
    }
}

fn write_response(mut stream: &UnixStream, response: &Response) -> Result<(), ControlError> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    Ok(())
}

impl EventSource for ControlListener {
    type Error = ControlError;

    /// Accept connections until the daemon loop goes away.
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<DaemonEvent>) -> Result<(), Self::Error> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    if !self.serve(stream, &sink) {
                        return Ok(());
                    }
                    debug!("client disconnected");
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        Ok(())
    }
}

//  Tests
