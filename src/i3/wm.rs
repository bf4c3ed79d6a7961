//! [`WindowManager`] implementation backed by i3 / sway IPC.
//!
//! Talks to the window manager's IPC socket directly; no child processes
//! are spawned and no helper crate is needed for the protocol.

use crate::command::{OutputInfo, Snapshot, WorkspaceInfo};
use crate::i3::ipc::{self, I3Error};
use crate::traits::WindowManager;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// i3- or sway-backed window manager.
///
/// No connection is held; each call opens a short-lived IPC request that
/// fails after `timeout` if the window manager does not answer.
#[derive(Debug, Clone)]
pub struct I3Wm {
    socket: PathBuf,
    timeout: Duration,
}

impl I3Wm {
    /// Use the IPC socket at `socket`.
    pub fn new(socket: impl AsRef<Path>) -> Self {
        Self {
            socket: socket.as_ref().to_path_buf(),
            timeout: ipc::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Locate the socket from the configured path or the environment.
    pub fn from_env(explicit: Option<&Path>) -> Result<Self, I3Error> {
        Ok(Self::new(ipc::socket_path(explicit)?))
    }

    /// The IPC socket this handle talks to.
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Run a command string and check that every part of it succeeded.
    fn run_command(&self, command: &str) -> Result<(), I3Error> {
        debug!("i3 command: {}", command);
        let reply = ipc::request(&self.socket, ipc::RUN_COMMAND, command.as_bytes(), self.timeout)?;
        check_command_reply(&reply)
    }

    fn query<T: for<'de> Deserialize<'de>>(&self, message_type: u32) -> Result<T, I3Error> {
        let reply = ipc::request(&self.socket, message_type, b"", self.timeout)?;
        serde_json::from_slice(&reply).map_err(|e| I3Error(format!("parse: {}", e)))
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of an element of the `GET_WORKSPACES` reply.
#[derive(Deserialize)]
struct WorkspaceJson {
    #[serde(default = "unnumbered")]
    num: i32,
    name: String,
    output: String,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    visible: bool,
}

fn unnumbered() -> i32 {
    -1
}

/// Subset of an element of the `GET_OUTPUTS` reply.
#[derive(Deserialize)]
struct OutputJson {
    name: String,
    #[serde(default)]
    active: bool,
    current_workspace: Option<String>,
}

/// One element of the `RUN_COMMAND` reply.
#[derive(Deserialize)]
struct CommandReplyJson {
    success: bool,
    error: Option<String>,
}

fn check_command_reply(reply: &[u8]) -> Result<(), I3Error> {
    let results: Vec<CommandReplyJson> =
        serde_json::from_slice(reply).map_err(|e| I3Error(format!("parse: {}", e)))?;
    match results.into_iter().find(|r| !r.success) {
        None => Ok(()),
        Some(failed) => Err(I3Error(format!(
            "command failed: {}",
            failed.error.unwrap_or_else(|| "unknown error".into())
        ))),
    }
}

/// Quote `arg` for the i3 command language.
pub(crate) fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn parse_snapshot(outputs: Vec<OutputJson>, workspaces: Vec<WorkspaceJson>) -> Snapshot {
    Snapshot {
        outputs: outputs
            .into_iter()
            .map(|o| OutputInfo {
                name: o.name,
                active: o.active,
                current_workspace: o.current_workspace,
            })
            .collect(),
        workspaces: workspaces
            .into_iter()
            .map(|w| WorkspaceInfo {
                num: w.num,
                name: w.name,
                output: w.output,
                focused: w.focused,
                visible: w.visible,
            })
            .collect(),
    }
}

//  WindowManager implementation

impl WindowManager for I3Wm {
    type Error = I3Error;

    fn snapshot(&self) -> Result<Snapshot, Self::Error> {
        let outputs: Vec<OutputJson> = self.query(ipc::GET_OUTPUTS)?;
        let workspaces: Vec<WorkspaceJson> = self.query(ipc::GET_WORKSPACES)?;
        Ok(parse_snapshot(outputs, workspaces))
    }

    fn focus_workspace(&self, name: &str) -> Result<(), Self::Error> {
        self.run_command(&format!("workspace {}", quote(name)))
    }

    fn move_workspace_to_output(&self, output: &str) -> Result<(), Self::Error> {
        self.run_command(&format!("move workspace to output {}", quote(output)))
    }
}
