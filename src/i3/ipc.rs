//! i3 IPC framing.
//!
//! Every message on an i3 (or sway) IPC socket is
//!
//! ```text
//! "i3-ipc" | payload length: u32 | message type: u32 | payload
//! ```
//!
//! with both integers in native byte order.  Replies carry the type of the
//! request they answer; events have the high bit of the type set.
//!
//! Every connection gets read and write timeouts: a window manager that
//! stopped answering must turn into an error, not a hung process.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAGIC: &[u8; 6] = b"i3-ipc";

pub const RUN_COMMAND: u32 = 0;
pub const GET_WORKSPACES: u32 = 1;
pub const SUBSCRIBE: u32 = 2;
pub const GET_OUTPUTS: u32 = 3;

/// Set on the type of every event message.
pub const EVENT_BIT: u32 = 1 << 31;
pub const EVENT_WORKSPACE: u32 = EVENT_BIT;
pub const EVENT_OUTPUT: u32 = EVENT_BIT | 1;
pub const EVENT_SHUTDOWN: u32 = EVENT_BIT | 6;

/// Refuse payloads above this size instead of allocating whatever a
/// corrupted header claims.
const MAX_PAYLOAD: u32 = 64 * 1024 * 1024;

/// Default bound on a single request/reply exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Errors that can occur when talking to i3 or sway.
#[derive(Debug, thiserror::Error)]
#[error("i3 IPC error: {0}")]
pub struct I3Error(pub String);

/// Resolve the IPC socket path: `explicit` if given, else `$I3SOCK`, else
/// `$SWAYSOCK`.
pub fn socket_path(explicit: Option<&Path>) -> Result<PathBuf, I3Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    ["I3SOCK", "SWAYSOCK"]
        .iter()
        .find_map(|var| std::env::var_os(var).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .ok_or_else(|| I3Error("neither I3SOCK nor SWAYSOCK is set".into()))
}

/// Encode one message.
pub fn encode(message_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAGIC.len() + 8 + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&message_type.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Write one message to `writer`.
pub fn write_message(mut writer: impl Write, message_type: u32, payload: &[u8]) -> Result<(), I3Error> {
    writer
        .write_all(&encode(message_type, payload))
        .map_err(|e| io_error("write", e))
}

/// Read one message from `reader`, returning its type and payload.
pub fn read_message(mut reader: impl Read) -> Result<(u32, Vec<u8>), I3Error> {
    let mut header = [0u8; 14];
    reader
        .read_exact(&mut header)
        .map_err(|e| io_error("read header", e))?;
    if &header[..6] != MAGIC {
        return Err(I3Error(format!("bad magic: {:?}", &header[..6])));
    }
    let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]);
    let message_type = u32::from_ne_bytes([header[10], header[11], header[12], header[13]]);
    if len > MAX_PAYLOAD {
        return Err(I3Error(format!("payload too large: {} bytes", len)));
    }

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|e| io_error("read payload", e))?;
    Ok((message_type, payload))
}

/// Socket timeouts surface as `WouldBlock` or `TimedOut` depending on the
/// platform.
fn io_error(what: &str, e: io::Error) -> I3Error {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            I3Error(format!("{}: window manager timed out", what))
        }
        _ => I3Error(format!("{}: {}", what, e)),
    }
}

/// Open a connection to the IPC socket at `path` with read and write
/// timeouts of `timeout`.
pub fn connect(path: &Path, timeout: Duration) -> Result<UnixStream, I3Error> {
    let stream = UnixStream::connect(path)
        .map_err(|e| I3Error(format!("connect to {}: {}", path.display(), e)))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| I3Error(format!("configure socket: {}", e)))?;
    Ok(stream)
}

/// Send a request on a fresh connection and return the reply payload.
pub fn request(
    path: &Path,
    message_type: u32,
    payload: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, I3Error> {
    let stream = connect(path, timeout)?;
    write_message(&stream, message_type, payload)?;
    let (reply_type, reply) = read_message(&stream)?;
    if reply_type != message_type {
        return Err(I3Error(format!(
            "expected reply type {}, got {}",
            message_type, reply_type
        )));
    }
    Ok(reply)
}
