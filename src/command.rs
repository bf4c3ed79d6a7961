//! Commands and types used throughout wscycle.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every verb the binary understands,
//! [`Direction`] drives the cycling engine, and [`OutputInfo`] /
//! [`WorkspaceInfo`] / [`Snapshot`] describe what the window manager
//! reports about its current state.

use std::fmt;
use std::str::FromStr;

/// Direction for cycling through the workspaces of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Every verb accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the daemon: track focus history and serve the control socket.
    Listen,
    /// Focus the next workspace on the current output, wrapping around.
    Next,
    /// Focus the previous workspace on the current output, wrapping around.
    Prev,
    /// Move the focused workspace to the next output, wrapping around.
    Toggle,
    /// Return to the previously focused workspace on the current output.
    Back,
    /// Print the daemon's per-output history.
    Status,
    /// Print usage.
    Help,
}

impl Command {
    /// Every verb, in the order shown in the usage text.
    pub const ALL: [Command; 7] = [
        Command::Listen,
        Command::Next,
        Command::Prev,
        Command::Toggle,
        Command::Back,
        Command::Status,
        Command::Help,
    ];

    /// The verb as typed on the command line.
    pub fn verb(self) -> &'static str {
        match self {
            Command::Listen => "listen",
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Toggle => "toggle",
            Command::Back => "back",
            Command::Status => "status",
            Command::Help => "help",
        }
    }

    /// The cycling direction for `next` / `prev`, `None` for other verbs.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Command::Next => Some(Direction::Forward),
            Command::Prev => Some(Direction::Backward),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// An unrecognised verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Parse a verb (case-insensitive; `previous`, `--help` and `-h` are
    /// accepted as aliases).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "listen" => Ok(Command::Listen),
            "next" => Ok(Command::Next),
            "prev" | "previous" => Ok(Command::Prev),
            "toggle" => Ok(Command::Toggle),
            "back" => Ok(Command::Back),
            "status" => Ok(Command::Status),
            "help" | "--help" | "-h" => Ok(Command::Help),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

/// A physical output as reported by the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    /// Connector name (e.g. `"HDMI-1"`).
    pub name: String,
    /// Whether the output is currently enabled.
    pub active: bool,
    /// The workspace the output currently shows, if any.
    pub current_workspace: Option<String>,
}

/// A workspace as reported by the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceInfo {
    /// Numeric prefix of the name, negative when the name has none.
    pub num: i32,
    /// Full workspace name (e.g. `"3:web"`).
    pub name: String,
    /// Name of the output the workspace lives on.
    pub output: String,
    /// Whether this is the single globally focused workspace.
    pub focused: bool,
    /// Whether the workspace is shown on its output.
    pub visible: bool,
}

/// Everything the registry needs from one window-manager query.
///
/// Outputs and workspaces are kept in the order the window manager
/// returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub outputs: Vec<OutputInfo>,
    pub workspaces: Vec<WorkspaceInfo>,
}
