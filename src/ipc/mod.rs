//! The control channel between one-shot commands and the daemon.
//!
//! The daemon binds a Unix stream socket ([`listener`]); commands that need
//! daemon state (`back`, `status`) connect with a [`client::ControlClient`],
//! send one newline-delimited JSON [`protocol::Request`] and read one
//! [`protocol::Response`] back.

pub mod client;
pub mod listener;
pub mod protocol;

use std::path::PathBuf;

/// Default control socket path (`$XDG_RUNTIME_DIR/wscycle.sock`, falling
/// back to `/tmp`).
pub fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("wscycle.sock")
}
