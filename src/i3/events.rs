//! Translates the i3 / sway event stream into [`DaemonEvent`]s.
//!
//! [`I3EventSource`] opens its own IPC connection, subscribes to
//! `workspace`, `output` and `shutdown` events and forwards:
//!
//! | i3 event                      | forwarded as                          |
//! |-------------------------------|---------------------------------------|
//! | `workspace` / `focus`         | [`DaemonEvent::WorkspaceFocused`]     |
//! | other `workspace` changes     | [`DaemonEvent::Topology`]             |
//! | `output`                      | [`DaemonEvent::Topology`]             |
//! | `shutdown` / `exit`           | [`DaemonEvent::Shutdown`]             |
//! | `shutdown` / `restart`        | reconnect                             |
//!
//! When the connection drops the source reconnects with exponential
//! backoff and sends a [`DaemonEvent::Topology`] once it is back, so the
//! daemon resynchronises with whatever happened in between.

use crate::config::ReconnectConfig;
use crate::i3::ipc::{self, I3Error};
use crate::traits::{DaemonEvent, EventSource};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

const SUBSCRIPTIONS: &str = r#"["workspace","output","shutdown"]"#;

/// An [`EventSource`] reading the window manager's event stream.
pub struct I3EventSource {
    socket: PathBuf,
    reconnect: ReconnectConfig,
    timeout: Duration,
}

/// What one incoming event means for the source.
#[derive(Debug)]
enum Step {
    Forward(DaemonEvent),
    Reconnect,
    Ignore,
}

/// Why a connection ended without an error.
enum SessionEnd {
    SinkClosed,
    Restart,
}

#[derive(Deserialize)]
struct NodeJson {
    name: Option<String>,
    output: Option<String>,
}

#[derive(Deserialize)]
struct WorkspaceEventJson {
    change: String,
    current: Option<NodeJson>,
}

#[derive(Deserialize)]
struct ShutdownEventJson {
    change: String,
}

#[derive(Deserialize)]
struct SubscribeReplyJson {
    success: bool,
}

fn parse<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, I3Error> {
    serde_json::from_slice(payload).map_err(|e| I3Error(format!("parse event: {}", e)))
}

/// Decide what to do with one event message.
fn translate(message_type: u32, payload: &[u8]) -> Result<Step, I3Error> {
    match message_type {
        ipc::EVENT_WORKSPACE => {
            let event: WorkspaceEventJson = parse(payload)?;
            match event.change.as_str() {
                "focus" => Ok(event
                    .current
                    .and_then(|node| {
                        let workspace = node.name?;
                        Some(DaemonEvent::WorkspaceFocused {
                            workspace,
                            output: node.output,
                        })
                    })
                    .map_or(Step::Ignore, Step::Forward)),
                "urgent" => Ok(Step::Ignore),
                _ => Ok(Step::Forward(DaemonEvent::Topology)),
            }
        }
        ipc::EVENT_OUTPUT => Ok(Step::Forward(DaemonEvent::Topology)),
        ipc::EVENT_SHUTDOWN => {
            let event: ShutdownEventJson = parse(payload)?;
            if event.change == "restart" {
                Ok(Step::Reconnect)
            } else {
                Ok(Step::Forward(DaemonEvent::Shutdown {
                    reason: format!("window manager shutdown ({})", event.change),
                }))
            }
        }
        other => {
            debug!("ignoring message type {:#x}", other);
            Ok(Step::Ignore)
        }
    }
}

impl I3EventSource {
    pub fn new(socket: impl AsRef<Path>, reconnect: ReconnectConfig) -> Self {
        Self {
            socket: socket.as_ref().to_path_buf(),
            reconnect,
            timeout: ipc::DEFAULT_TIMEOUT,
        }
    }

    /// Bound the wait for the subscription reply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect, subscribe and forward events until the connection ends.
    ///
    /// `delay` is reset to the initial backoff once the subscription is
    /// confirmed.
    fn session(
        &self,
        sink: &mpsc::Sender<DaemonEvent>,
        resync: bool,
        delay: &mut Duration,
    ) -> Result<SessionEnd, I3Error> {
        let stream = ipc::connect(&self.socket, self.timeout)?;
        ipc::write_message(&stream, ipc::SUBSCRIBE, SUBSCRIPTIONS.as_bytes())?;
        let (reply_type, reply) = ipc::read_message(&stream)?;
        if reply_type != ipc::SUBSCRIBE || !parse::<SubscribeReplyJson>(&reply)?.success {
            return Err(I3Error("subscription rejected".into()));
        }
        // Events arrive whenever they happen.
        stream
            .set_read_timeout(None)
            .map_err(|e| I3Error(format!("configure socket: {}", e)))?;
        info!("subscribed to events on {}", self.socket.display());
        *delay = self.reconnect.initial_delay();

        if resync && sink.send(DaemonEvent::Topology).is_err() {
            return Ok(SessionEnd::SinkClosed);
        }

        loop {
            let (message_type, payload) = ipc::read_message(&stream)?;
            match translate(message_type, &payload) {
                Ok(Step::Forward(event)) => {
                    debug!("event: {:?}", event);
                    let stop = matches!(event, DaemonEvent::Shutdown { .. });
                    if sink.send(event).is_err() || stop {
                        return Ok(SessionEnd::SinkClosed);
                    }
                }
                Ok(Step::Reconnect) => return Ok(SessionEnd::Restart),
                Ok(Step::Ignore) => {}
                Err(e) => warn!("malformed event: {}", e),
            }
        }
    }
}

impl EventSource for I3EventSource {
    type Error = I3Error;

    /// Forward events forever, reconnecting whenever the stream drops.
    ///
    /// Returns once the daemon loop has gone away or the window manager
    /// announced that it exits.
    fn run(&mut self, sink: mpsc::Sender<DaemonEvent>) -> Result<(), Self::Error> {
        let mut delay = self.reconnect.initial_delay();
        let mut resync = false;
        loop {
            match self.session(&sink, resync, &mut delay) {
                Ok(SessionEnd::SinkClosed) => return Ok(()),
                Ok(SessionEnd::Restart) => info!("window manager restarting, reconnecting"),
                Err(e) => warn!("event stream lost: {} (retrying in {:?})", e, delay),
            }
            resync = true;
            std::thread::sleep(delay);
            delay = self.reconnect.next_delay(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i3::ipc::{read_message, write_message};
    use crate::ipc::listener::tests::tmp_socket_path;
    use std::os::unix::net::UnixListener;

    fn workspace_event(json: &str) -> Step {
        translate(ipc::EVENT_WORKSPACE, json.as_bytes()).unwrap()
    }

    #[test]
    fn focus_event_with_output() {
        let step = workspace_event(
            r#"{"change":"focus","current":{"id":1,"type":"workspace","name":"2","output":"HDMI-1"},
                "old":{"id":2,"name":"1","output":"HDMI-1"}}"#,
        );
        match step {
            Step::Forward(DaemonEvent::WorkspaceFocused { workspace, output }) => {
                assert_eq!(workspace, "2");
                assert_eq!(output.as_deref(), Some("HDMI-1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn focus_event_without_output() {
        // i3 workspace nodes may omit the output field.
        let step = workspace_event(r#"{"change":"focus","current":{"name":"7"},"old":null}"#);
        assert!(matches!(
            step,
            Step::Forward(DaemonEvent::WorkspaceFocused { output: None, .. })
        ));
    }

    #[test]
    fn focus_event_without_current_is_ignored() {
        assert!(matches!(
            workspace_event(r#"{"change":"focus","current":null}"#),
            Step::Ignore
        ));
    }

    #[test]
    fn other_workspace_changes_refresh_topology() {
        for change in ["init", "empty", "move", "rename", "reload", "restored"] {
            let json = format!(r#"{{"change":"{}","current":{{"name":"3"}}}}"#, change);
            assert!(
                matches!(workspace_event(&json), Step::Forward(DaemonEvent::Topology)),
                "{change}"
            );
        }
        assert!(matches!(
            workspace_event(r#"{"change":"urgent","current":{"name":"3"}}"#),
            Step::Ignore
        ));
    }

    #[test]
    fn output_and_shutdown_events() {
        assert!(matches!(
            translate(ipc::EVENT_OUTPUT, br#"{"change":"unspecified"}"#).unwrap(),
            Step::Forward(DaemonEvent::Topology)
        ));
        assert!(matches!(
            translate(ipc::EVENT_SHUTDOWN, br#"{"change":"restart"}"#).unwrap(),
            Step::Reconnect
        ));
        assert!(matches!(
            translate(ipc::EVENT_SHUTDOWN, br#"{"change":"exit"}"#).unwrap(),
            Step::Forward(DaemonEvent::Shutdown { .. })
        ));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(translate(ipc::EVENT_WORKSPACE, b"{").is_err());
    }

    #[test]
    fn subscribes_and_forwards_events() {
        let path = tmp_socket_path();
        let listener = UnixListener::bind(&path).expect("bind");
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let (ty, payload) = read_message(&stream).unwrap();
            assert_eq!(ty, ipc::SUBSCRIBE);
            assert_eq!(payload, SUBSCRIPTIONS.as_bytes());
            write_message(&stream, ipc::SUBSCRIBE, br#"{"success":true}"#).unwrap();
            write_message(
                &stream,
                ipc::EVENT_WORKSPACE,
                br#"{"change":"focus","current":{"name":"5","output":"eDP-1"}}"#,
            )
            .unwrap();
            write_message(&stream, ipc::EVENT_OUTPUT, br#"{"change":"unspecified"}"#).unwrap();
            write_message(&stream, ipc::EVENT_SHUTDOWN, br#"{"change":"exit"}"#).unwrap();
        });

        let (tx, rx) = mpsc::channel();
        let mut source = I3EventSource::new(&path, ReconnectConfig::default());
        source.run(tx).unwrap();
        server.join().unwrap();

        let events: Vec<DaemonEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 3, "{events:?}");
        assert!(matches!(
            &events[0],
            DaemonEvent::WorkspaceFocused { workspace, .. } if workspace == "5"
        ));
        assert!(matches!(events[1], DaemonEvent::Topology));
        assert!(matches!(events[2], DaemonEvent::Shutdown { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unanswered_subscription_times_out() {
        use std::io::Read;

        let path = tmp_socket_path();
        let listener = UnixListener::bind(&path).expect("bind");
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink);
        });

        let (tx, _rx) = mpsc::channel();
        let source = I3EventSource::new(&path, ReconnectConfig::default())
            .with_timeout(Duration::from_millis(100));
        let mut delay = Duration::from_secs(7);
        match source.session(&tx, false, &mut delay) {
            Err(e) => assert!(e.to_string().contains("timed out"), "{e}"),
            Ok(_) => panic!("session should have failed"),
        }
        // Backoff is only reset once a subscription is confirmed.
        assert_eq!(delay, Duration::from_secs(7));
        drop(source);
        server.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reconnects_after_the_stream_drops() {
        let path = tmp_socket_path();
        let listener = UnixListener::bind(&path).expect("bind");
        let server = std::thread::spawn(move || {
            // First connection: subscribe, then hang up.
            {
                let (stream, _) = listener.accept().expect("accept");
                read_message(&stream).unwrap();
                write_message(&stream, ipc::SUBSCRIBE, br#"{"success":true}"#).unwrap();
            }
            // Second connection: subscribe, then announce exit.
            let (stream, _) = listener.accept().expect("accept");
            read_message(&stream).unwrap();
            write_message(&stream, ipc::SUBSCRIBE, br#"{"success":true}"#).unwrap();
            write_message(&stream, ipc::EVENT_SHUTDOWN, br#"{"change":"exit"}"#).unwrap();
        });

        let (tx, rx) = mpsc::channel();
        let reconnect = ReconnectConfig {
            initial_delay_ms: 10,
            max_delay_ms: 20,
        };
        let mut source = I3EventSource::new(&path, reconnect);
        source.run(tx).unwrap();
        server.join().unwrap();

        let events: Vec<DaemonEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], DaemonEvent::Topology), "{events:?}");
        assert!(matches!(events[1], DaemonEvent::Shutdown { .. }));
        let _ = std::fs::remove_file(&path);
    }
}
