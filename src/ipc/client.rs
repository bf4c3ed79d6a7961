//! Client side of the control socket, used by one-shot commands.

use crate::ipc::protocol::{Request, Response};
use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors produced on either side of the control socket.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("no daemon listening on {path}: {source}")]
    NotRunning { path: String, source: io::Error },
    #[error("a daemon is already listening on {0}")]
    AlreadyRunning(String),
    #[error("daemon did not answer within {0:?}")]
    Timeout(Duration),
    #[error("daemon closed the connection without answering")]
    NoResponse,
    #[error("unexpected response: {0:?}")]
    Unexpected(Response),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sends single requests to a running daemon.
///
/// Every call opens a fresh connection with read and write timeouts, so an
/// unresponsive daemon makes the command fail fast instead of hanging a
/// key binding.
#[derive(Debug, Clone)]
pub struct ControlClient {
    path: PathBuf,
    timeout: Duration,
}

impl ControlClient {
    pub fn new(path: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout,
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send `request` and wait for the response.
    pub fn request(&self, request: &Request) -> Result<Response, ControlError> {
        let stream =
            UnixStream::connect(&self.path).map_err(|source| ControlError::NotRunning {
                path: self.path.display().to_string(),
                source,
            })?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        (&stream)
            .write_all(line.as_bytes())
            .map_err(|e| self.classify(e))?;

        let mut reader = BufReader::new(&stream);
        let mut response = String::new();
        let read = reader
            .read_line(&mut response)
            .map_err(|e| self.classify(e))?;
        if read == 0 {
            return Err(ControlError::NoResponse);
        }
        Ok(serde_json::from_str(response.trim())?)
    }

    /// Ask for the workspace `back` should focus on `output`.
    ///
    /// `Ok(None)` means the daemon has nothing to go back to.
    pub fn previous_on(&self, output: &str) -> Result<Option<String>, ControlError> {
        match self.request(&Request::PreviousOn {
            output: output.to_string(),
        })? {
            Response::Previous { workspace } => Ok(Some(workspace)),
            Response::NoHistory { .. } => Ok(None),
            other => Err(ControlError::Unexpected(other)),
        }
    }

    /// Fetch the daemon's per-output history.
    pub fn status(&self) -> Result<BTreeMap<String, Vec<String>>, ControlError> {
        match self.request(&Request::Status)? {
            Response::Status { history } => Ok(history),
            other => Err(ControlError::Unexpected(other)),
        }
    }

    /// Check that a daemon is answering on the socket.
    pub fn ping(&self) -> Result<(), ControlError> {
        match self.request(&Request::Ping)? {
            Response::Pong => Ok(()),
            other => Err(ControlError::Unexpected(other)),
        }
    }

    fn classify(&self, e: io::Error) -> ControlError {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                ControlError::Timeout(self.timeout)
            }
            _ => ControlError::Io(e),
        }
    }
}
