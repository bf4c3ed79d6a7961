//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/wscycle/config.json`.
//! Every key is optional: a missing file or a minimal `{}` file yields the
//! compiled-in defaults, and unknown keys are ignored so the file can grow
//! new sections without breaking older binaries.
//!
//! # Example
//!
//! ```json
//! {
//!   "history_depth": 16,
//!   "control_socket": "/run/user/1000/wscycle.sock",
//!   "wm_socket": "/run/user/1000/i3/ipc-socket.1234",
//!   "request_timeout_ms": 500,
//!   "wm_timeout_ms": 1000,
//!   "reconnect": {
//!     "initial_delay_ms": 250,
//!     "max_delay_ms": 5000
//!   }
//! }
//! ```

use crate::history::DEFAULT_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspaces remembered per output.  Values below 2 are raised to 2.
    pub history_depth: usize,

    /// Control socket path.  Defaults to `$XDG_RUNTIME_DIR/wscycle.sock`.
    pub control_socket: Option<PathBuf>,

    /// Window-manager IPC socket.  Defaults to `$I3SOCK`, then `$SWAYSOCK`.
    pub wm_socket: Option<PathBuf>,

    /// How long a command waits for the daemon, and the daemon waits for
    /// its own loop, before giving up (ms).
    pub request_timeout_ms: u64,

    /// How long a single window-manager IPC request may take (ms).
    pub wm_timeout_ms: u64,

    /// Backoff used when the window-manager event stream drops.
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_DEPTH,
            control_socket: None,
            wm_socket: None,
            request_timeout_ms: 500,
            wm_timeout_ms: 1000,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Exponential backoff for re-subscribing to window-manager events.
///
/// All durations are in **milliseconds**.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay_ms: u64,
    /// Upper bound for the doubling delay.
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

impl ReconnectConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms.max(1))
    }

    /// Double `current`, capped at `max_delay_ms`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let max = Duration::from_millis(self.max_delay_ms.max(self.initial_delay_ms).max(1));
        (current * 2).min(max)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// The control socket, falling back to the default location.
    pub fn control_socket_path(&self) -> PathBuf {
        self.control_socket
            .clone()
            .unwrap_or_else(crate::ipc::default_socket_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn wm_timeout(&self) -> Duration {
        Duration::from_millis(self.wm_timeout_ms.max(1))
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/wscycle`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("wscycle")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
