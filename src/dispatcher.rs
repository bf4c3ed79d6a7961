//! Turns navigation verbs into window-manager actions.
//!
//! [`Dispatcher`] takes a fresh snapshot for every command, asks the pure
//! engine ([`cycle`], [`toggle_target`], a [`HistoryLookup`]) what to do and
//! issues exactly one focus or move action.  Engine errors are recovered
//! here as [`Outcome::Skipped`]: a hotkey must never crash.

use crate::command::{Command, Direction};
use crate::cycle::cycle;
use crate::error::EngineError;
use crate::history::HistoryTracker;
use crate::ipc::client::{ControlClient, ControlError};
use crate::registry::Registry;
use crate::toggle::toggle_target;
use crate::traits::WindowManager;
use log::{debug, info, warn};
use std::fmt;

/// Errors a command can end with.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Nothing to do; recovered by [`Dispatcher::handle`].
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The daemon could not be reached for `back`.
    #[error("wscycle daemon not reachable ({0}); start it with `wscycle listen`")]
    NoDaemon(String),

    /// The window manager (or the daemon) failed or answered garbage.
    #[error("window manager error: {0}")]
    Transport(String),
}

impl From<ControlError> for DispatchError {
    fn from(e: ControlError) -> Self {
        match e {
            ControlError::NotRunning { .. } | ControlError::Timeout(_) | ControlError::NoResponse => {
                DispatchError::NoDaemon(e.to_string())
            }
            other => DispatchError::Transport(other.to_string()),
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A workspace was focused.
    Focused { workspace: String },
    /// The focused workspace was moved to another output.
    Moved { workspace: String, output: String },
    /// There was deliberately nothing to do.
    Unchanged { reason: String },
    /// The engine could not answer; no action was issued.
    Skipped(EngineError),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Focused { workspace } => write!(f, "focused workspace {}", workspace),
            Outcome::Moved { workspace, output } => {
                write!(f, "moved workspace {} to {}", workspace, output)
            }
            Outcome::Unchanged { reason } => write!(f, "nothing to do: {}", reason),
            Outcome::Skipped(e) => write!(f, "nothing to do: {}", e),
        }
    }
}

/// Where `back` gets its answer from.
pub trait HistoryLookup {
    /// The workspace to go back to on `output`, given the current state.
    fn lookup_previous(&mut self, output: &str, registry: &Registry) -> Result<String, DispatchError>;
}

/// In-process history, as owned by the daemon.
impl HistoryLookup for HistoryTracker {
    fn lookup_previous(&mut self, output: &str, registry: &Registry) -> Result<String, DispatchError> {
        Ok(self.previous_on(output, registry)?.to_string())
    }
}

/// History held by a running daemon, reached over the control socket.
///
/// The daemon checks staleness against its own fresh snapshot, so the local
/// registry is not consulted.
impl HistoryLookup for ControlClient {
    fn lookup_previous(&mut self, output: &str, _registry: &Registry) -> Result<String, DispatchError> {
        self.previous_on(output)?.ok_or_else(|| {
            EngineError::NoHistory {
                output: output.to_string(),
            }
            .into()
        })
    }
}

/// Executes navigation commands against a [`WindowManager`].
pub struct Dispatcher<W: WindowManager> {
    wm: W,
}

impl<W: WindowManager> Dispatcher<W> {
    pub fn new(wm: W) -> Self {
        Self { wm }
    }

    /// Run a navigation command, recovering engine errors as
    /// [`Outcome::Skipped`].
    ///
    /// Verbs that are not navigation commands are reported as
    /// [`Outcome::Unchanged`].
    pub fn handle<H: HistoryLookup>(
        &self,
        command: Command,
        history: &mut H,
    ) -> Result<Outcome, DispatchError> {
        let result = match (command, command.direction()) {
            (_, Some(direction)) => self.cycle(direction),
            (Command::Toggle, _) => self.toggle(),
            (Command::Back, _) => self.back(history),
            (other, None) => Ok(Outcome::Unchanged {
                reason: format!("{} is not a navigation command", other),
            }),
        };
        match result {
            Err(DispatchError::Engine(e)) => {
                warn!("{}: {}", command, e);
                Ok(Outcome::Skipped(e))
            }
            other => other,
        }
    }

    fn registry(&self) -> Result<Registry, DispatchError> {
        let snapshot = self
            .wm
            .snapshot()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(Registry::from_snapshot(&snapshot))
    }

    fn focus(&self, workspace: &str) -> Result<Outcome, DispatchError> {
        self.wm
            .focus_workspace(workspace)
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(Outcome::Focused {
            workspace: workspace.to_string(),
        })
    }

    /// Focus the next or previous workspace on the current output.
    pub fn cycle(&self, direction: Direction) -> Result<Outcome, DispatchError> {
        let registry = self.registry()?;
        let target = cycle(&registry, direction)?;
        info!("cycle {}: {} -> {}", direction, registry.focused_workspace()?, target);
        self.focus(target)
    }

    /// Move the focused workspace to the next output and keep it focused.
    pub fn toggle(&self) -> Result<Outcome, DispatchError> {
        let registry = self.registry()?;
        let Some(target) = toggle_target(&registry)? else {
            debug!("toggle: single output, nothing to move");
            return Ok(Outcome::Unchanged {
                reason: "only one output".into(),
            });
        };
        info!("toggle: {} {} -> {}", target.workspace, target.from, target.to);
        self.wm
            .move_workspace_to_output(&target.to)
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        self.wm
            .focus_workspace(&target.workspace)
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(Outcome::Moved {
            workspace: target.workspace,
            output: target.to,
        })
    }

    /// Return to the previous workspace on the current output.
    pub fn back<H: HistoryLookup>(&self, history: &mut H) -> Result<Outcome, DispatchError> {
        let registry = self.registry()?;
        let output = registry.current_output()?;
        let previous = history.lookup_previous(output, &registry)?;
        info!("back on {}: -> {}", output, previous);
        self.focus(&previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::listener::tests::tmp_socket_path;
    use crate::traits::tests::RecorderWm;
    use std::time::Duration;

    /// History double answering every lookup with the same result.
    struct FixedHistory(Result<String, EngineError>);

    impl HistoryLookup for FixedHistory {
        fn lookup_previous(&mut self, _: &str, _: &Registry) -> Result<String, DispatchError> {
            self.0.clone().map_err(Into::into)
        }
    }

    fn no_history() -> FixedHistory {
        FixedHistory(Err(EngineError::NoHistory {
            output: "HDMI-1".into(),
        }))
    }

    fn dispatcher(layout: &[(&str, &[&str])], focused: &str) -> Dispatcher<RecorderWm> {
        Dispatcher::new(RecorderWm::new(layout, focused))
    }

    #[test]
    fn next_next_prev_scenario() {
        let d = dispatcher(&[("HDMI-1", &["1", "2", "3"]), ("eDP-1", &["5"])], "2");
        let mut h = no_history();
        assert_eq!(
            d.handle(Command::Next, &mut h).unwrap(),
            Outcome::Focused {
                workspace: "3".into()
            }
        );
        d.handle(Command::Next, &mut h).unwrap();
        assert_eq!(d.wm.focused().as_deref(), Some("1"));
        d.handle(Command::Prev, &mut h).unwrap();
        assert_eq!(d.wm.focused().as_deref(), Some("3"));
        assert_eq!(*d.wm.focus_log.borrow(), vec!["3", "1", "3"]);
    }

    #[test]
    fn toggle_three_outputs_scenario() {
        let d = dispatcher(
            &[("HDMI-1", &["4"]), ("eDP-1", &["5"]), ("DP-1", &["6"])],
            "4",
        );
        let mut h = no_history();
        assert_eq!(
            d.handle(Command::Toggle, &mut h).unwrap(),
            Outcome::Moved {
                workspace: "4".into(),
                output: "eDP-1".into()
            }
        );
        d.handle(Command::Toggle, &mut h).unwrap();
        d.handle(Command::Toggle, &mut h).unwrap();
        assert_eq!(*d.wm.move_log.borrow(), vec!["eDP-1", "DP-1", "HDMI-1"]);
        // Focus follows the moved workspace every time.
        assert_eq!(*d.wm.focus_log.borrow(), vec!["4", "4", "4"]);
        let snap = d.wm.snapshot().unwrap();
        let four = snap.workspaces.iter().find(|w| w.name == "4").unwrap();
        assert_eq!(four.output, "HDMI-1");
    }

    #[test]
    fn toggle_with_one_output_issues_no_move() {
        let d = dispatcher(&[("HDMI-1", &["1", "2"])], "2");
        let outcome = d.handle(Command::Toggle, &mut no_history()).unwrap();
        assert!(matches!(outcome, Outcome::Unchanged { .. }));
        assert!(d.wm.move_log.borrow().is_empty());
        assert!(d.wm.focus_log.borrow().is_empty());
    }

    #[test]
    fn back_focuses_what_history_says() {
        let d = dispatcher(&[("eDP-1", &["5", "7", "9"])], "9");
        let mut h = FixedHistory(Ok("5".into()));
        assert_eq!(
            d.handle(Command::Back, &mut h).unwrap(),
            Outcome::Focused {
                workspace: "5".into()
            }
        );
    }

    #[test]
    fn back_with_local_tracker() {
        let d = dispatcher(&[("eDP-1", &["5", "7", "9"])], "9");
        let mut tracker = HistoryTracker::default();
        for ws in ["5", "7", "5", "9"] {
            tracker.record_focus("eDP-1", ws);
        }
        d.handle(Command::Back, &mut tracker).unwrap();
        assert_eq!(d.wm.focused().as_deref(), Some("5"));
    }

    #[test]
    fn engine_errors_are_recovered_as_noops() {
        let d = dispatcher(&[("eDP-1", &["5"])], "5");
        let outcome = d.handle(Command::Back, &mut no_history()).unwrap();
        assert!(matches!(outcome, Outcome::Skipped(EngineError::NoHistory { .. })));
        assert!(d.wm.focus_log.borrow().is_empty());

        // No focused workspace at all.
        let d = dispatcher(&[("eDP-1", &["5"])], "none");
        for cmd in [Command::Next, Command::Prev, Command::Toggle, Command::Back] {
            let outcome = d.handle(cmd, &mut no_history()).unwrap();
            assert_eq!(outcome, Outcome::Skipped(EngineError::NoFocus), "{cmd}");
        }
        assert!(d.wm.focus_log.borrow().is_empty());
    }

    #[test]
    fn transport_errors_are_surfaced() {
        let d = dispatcher(&[("eDP-1", &["5", "6"])], "5");
        *d.wm.fail.borrow_mut() = true;
        assert!(matches!(
            d.handle(Command::Next, &mut no_history()),
            Err(DispatchError::Transport(_))
        ));
    }

    #[test]
    fn back_without_daemon_is_no_daemon() {
        let d = dispatcher(&[("eDP-1", &["5", "6"])], "5");
        let mut client = ControlClient::new(tmp_socket_path(), Duration::from_millis(100));
        assert!(matches!(
            d.handle(Command::Back, &mut client),
            Err(DispatchError::NoDaemon(_))
        ));
    }

    #[test]
    fn non_navigation_verbs_are_unchanged() {
        let d = dispatcher(&[("eDP-1", &["5"])], "5");
        for cmd in [Command::Listen, Command::Status, Command::Help] {
            assert!(matches!(
                d.handle(cmd, &mut no_history()).unwrap(),
                Outcome::Unchanged { .. }
            ));
        }
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            Outcome::Moved {
                workspace: "4".into(),
                output: "eDP-1".into()
            }
            .to_string(),
            "moved workspace 4 to eDP-1"
        );
        assert_eq!(
            Outcome::Skipped(EngineError::NoFocus).to_string(),
            "nothing to do: no focused workspace"
        );
    }
}
