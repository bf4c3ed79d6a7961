//! Messages exchanged over the control socket.
//!
//! Every connection carries exactly one request line and one response line,
//! both JSON:
//!
//! ```json
//! {"PreviousOn":{"output":"eDP-1"}}   ->  {"Previous":{"workspace":"5"}}
//! {"PreviousOn":{"output":"eDP-1"}}   ->  {"NoHistory":{"output":"eDP-1"}}
//! "Status"                            ->  {"Status":{"history":{"eDP-1":["5","7"]}}}
//! "Ping"                              ->  "Pong"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request from a short-lived command to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Which workspace should `back` return to on `output`?
    PreviousOn { output: String },

    /// Dump the per-output history.
    Status,

    /// Liveness check, used to detect a running daemon.
    Ping,
}

/// The daemon's answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// The workspace to go back to.
    Previous { workspace: String },

    /// Nothing to go back to on `output`.
    NoHistory { output: String },

    /// Per-output history, oldest entry first.
    Status {
        history: BTreeMap<String, Vec<String>>,
    },

    /// Answer to [`Request::Ping`].
    Pong,

    /// The daemon could not serve the request.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_format() {
        let req = Request::PreviousOn {
            output: "eDP-1".into(),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"PreviousOn":{"output":"eDP-1"}}"#
        );
        assert_eq!(serde_json::to_string(&Request::Status).unwrap(), r#""Status""#);
        assert_eq!(
            serde_json::from_str::<Request>(r#""Ping""#).unwrap(),
            Request::Ping
        );
    }

    #[test]
    fn response_wire_format() {
        let json = r#"{"Status":{"history":{"eDP-1":["5","7"]}}}"#;
        let resp: Response = serde_json::from_str(json).unwrap();
        let mut history = BTreeMap::new();
        history.insert("eDP-1".to_string(), vec!["5".to_string(), "7".to_string()]);
        assert_eq!(resp, Response::Status { history });

        let resp: Response = serde_json::from_str(r#"{"Previous":{"workspace":"5"}}"#).unwrap();
        assert_eq!(
            resp,
            Response::Previous {
                workspace: "5".into()
            }
        );
    }

    #[test]
    fn unknown_request_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#""Explode""#).is_err());
        assert!(serde_json::from_str::<Request>("not json").is_err());
    }
}
