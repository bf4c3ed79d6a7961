//! Per-output focus history.
//!
//! The [`HistoryTracker`] keeps, for every output, the workspaces that were
//! focused on it, most recent last.  Consecutive duplicates are never
//! recorded, so the window manager re-announcing the same focus is harmless.
//!
//! Destroyed workspaces are not purged when they vanish.  Instead
//! [`HistoryTracker::previous_on`] skips entries that are no longer present
//! on the output at query time.

use crate::error::EngineError;
use crate::registry::Registry;
use log::debug;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Default number of entries kept per output.
pub const DEFAULT_DEPTH: usize = 16;

/// Per-output record of recently focused workspaces.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    depth: usize,
    per_output: HashMap<String, VecDeque<String>>,
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl HistoryTracker {
    /// Create a tracker keeping at most `depth` entries per output.
    ///
    /// `depth` is raised to 2, the minimum that can answer "previous".
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(2),
            per_output: HashMap::new(),
        }
    }

    /// Maximum number of entries kept per output.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record that `workspace` gained focus on `output`.
    ///
    /// Returns `false` when `workspace` already is the most recent entry.
    pub fn record_focus(&mut self, output: &str, workspace: &str) -> bool {
        let entries = self.per_output.entry(output.to_string()).or_default();
        if entries.back().map(String::as_str) == Some(workspace) {
            return false;
        }
        entries.push_back(workspace.to_string());
        while entries.len() > self.depth {
            entries.pop_front();
        }
        debug!("history {}: {:?}", output, entries);
        true
    }

    /// The workspace to go back to on `output`.
    ///
    /// Walks the history from newest to oldest and returns the first entry
    /// that is neither the workspace `output` currently shows nor gone from
    /// `output`.
    pub fn previous_on<'a>(
        &'a self,
        output: &str,
        registry: &Registry,
    ) -> Result<&'a str, EngineError> {
        let current = match registry.current_output() {
            Ok(focused_output) if focused_output == output => registry.focused_workspace().ok(),
            _ => registry.visible_on(output),
        };
        self.per_output
            .get(output)
            .into_iter()
            .flat_map(|entries| entries.iter().rev())
            .map(String::as_str)
            .find(|ws| Some(*ws) != current && registry.contains(output, ws))
            .ok_or_else(|| EngineError::NoHistory {
                output: output.to_string(),
            })
    }

    /// Drop the history of an output that no longer exists.
    pub fn forget_output(&mut self, output: &str) -> bool {
        self.per_output.remove(output).is_some()
    }

    /// Recorded entries on `output`, oldest first.
    #[cfg(test)]
    pub(crate) fn entries(&self, output: &str) -> Vec<&str> {
        self.per_output
            .get(output)
            .map(|e| e.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// All histories, keyed by output name.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.per_output
            .iter()
            .map(|(output, entries)| (output.clone(), entries.iter().cloned().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::snapshot;

    fn record_all(tracker: &mut HistoryTracker, output: &str, sequence: &[&str]) {
        for ws in sequence {
            tracker.record_focus(output, ws);
        }
    }

    #[test]
    fn back_after_revisit_scenario() {
        let mut t = HistoryTracker::default();
        record_all(&mut t, "eDP-1", &["5", "7", "5", "9"]);
        assert_eq!(t.entries("eDP-1"), vec!["5", "7", "5", "9"]);

        let reg = Registry::from_snapshot(&snapshot(&[("eDP-1", &["5", "7", "9"])], "9"));
        assert_eq!(t.previous_on("eDP-1", &reg), Ok("5"));
    }

    #[test]
    fn duplicate_focus_events_are_not_recorded() {
        let mut t = HistoryTracker::default();
        assert!(t.record_focus("eDP-1", "5"));
        assert!(!t.record_focus("eDP-1", "5"));
        assert!(t.record_focus("eDP-1", "7"));
        assert!(!t.record_focus("eDP-1", "7"));
        assert_eq!(t.entries("eDP-1"), vec!["5", "7"]);
    }

    #[test]
    fn no_two_consecutive_entries_are_equal() {
        let mut t = HistoryTracker::new(64);
        let sequence = ["1", "1", "2", "2", "2", "1", "3", "3", "1", "1"];
        record_all(&mut t, "HDMI-1", &sequence);
        let entries = t.entries("HDMI-1");
        assert!(entries.windows(2).all(|w| w[0] != w[1]), "{entries:?}");
        assert_eq!(entries, vec!["1", "2", "1", "3", "1"]);
    }

    #[test]
    fn previous_is_the_prior_event_for_every_prefix() {
        let sequence = ["1", "2", "3", "1", "4", "2", "5"];
        let reg_layout: &[(&str, &[&str])] = &[("HDMI-1", &["1", "2", "3", "4", "5"])];
        let mut t = HistoryTracker::default();
        t.record_focus("HDMI-1", sequence[0]);
        for k in 1..sequence.len() {
            t.record_focus("HDMI-1", sequence[k]);
            let reg = Registry::from_snapshot(&snapshot(reg_layout, sequence[k]));
            assert_eq!(t.previous_on("HDMI-1", &reg), Ok(sequence[k - 1]));
        }
    }

    #[test]
    fn destroyed_entries_are_skipped() {
        let mut t = HistoryTracker::default();
        record_all(&mut t, "eDP-1", &["5", "7", "9"]);
        // Workspace 7 was emptied and destroyed.
        let reg = Registry::from_snapshot(&snapshot(&[("eDP-1", &["5", "9"])], "9"));
        assert_eq!(t.previous_on("eDP-1", &reg), Ok("5"));
        // Nothing is purged eagerly.
        assert_eq!(t.entries("eDP-1"), vec!["5", "7", "9"]);
    }

    #[test]
    fn entries_moved_to_another_output_are_skipped() {
        let mut t = HistoryTracker::default();
        record_all(&mut t, "HDMI-1", &["1", "4", "2"]);
        let reg = Registry::from_snapshot(&snapshot(
            &[("HDMI-1", &["1", "2"]), ("eDP-1", &["4"])],
            "2",
        ));
        assert_eq!(t.previous_on("HDMI-1", &reg), Ok("1"));
    }

    #[test]
    fn no_history_when_everything_is_stale() {
        let mut t = HistoryTracker::default();
        record_all(&mut t, "eDP-1", &["5", "7", "9"]);
        let reg = Registry::from_snapshot(&snapshot(&[("eDP-1", &["9"])], "9"));
        assert_eq!(
            t.previous_on("eDP-1", &reg),
            Err(EngineError::NoHistory {
                output: "eDP-1".into()
            })
        );
    }

    #[test]
    fn no_history_on_first_focus() {
        let mut t = HistoryTracker::default();
        t.record_focus("eDP-1", "5");
        let reg = Registry::from_snapshot(&snapshot(&[("eDP-1", &["5"])], "5"));
        assert!(matches!(
            t.previous_on("eDP-1", &reg),
            Err(EngineError::NoHistory { .. })
        ));
        assert!(matches!(
            t.previous_on("HDMI-1", &reg),
            Err(EngineError::NoHistory { .. })
        ));
    }

    #[test]
    fn lagging_history_returns_most_recent_entry() {
        // Focus moved to 9 but the tracker has not seen it yet.
        let mut t = HistoryTracker::default();
        record_all(&mut t, "eDP-1", &["5", "7"]);
        let reg = Registry::from_snapshot(&snapshot(&[("eDP-1", &["5", "7", "9"])], "9"));
        assert_eq!(t.previous_on("eDP-1", &reg), Ok("7"));
    }

    #[test]
    fn unfocused_output_uses_its_visible_workspace() {
        let mut t = HistoryTracker::default();
        record_all(&mut t, "eDP-1", &["5", "7"]);
        // Global focus is on HDMI-1; eDP-1 still shows 7.
        let reg = Registry::from_snapshot(&snapshot(
            &[("HDMI-1", &["1"]), ("eDP-1", &["7", "5"])],
            "1",
        ));
        assert_eq!(reg.visible_on("eDP-1"), Some("7"));
        assert_eq!(t.previous_on("eDP-1", &reg), Ok("5"));
    }

    #[test]
    fn history_is_bounded() {
        let mut t = HistoryTracker::new(3);
        record_all(&mut t, "eDP-1", &["1", "2", "3", "4", "5"]);
        assert_eq!(t.entries("eDP-1"), vec!["3", "4", "5"]);
    }

    #[test]
    fn depth_is_at_least_two() {
        assert_eq!(HistoryTracker::new(0).depth(), 2);
        assert_eq!(HistoryTracker::new(1).depth(), 2);
        assert_eq!(HistoryTracker::default().depth(), DEFAULT_DEPTH);
    }

    #[test]
    fn outputs_are_tracked_independently() {
        let mut t = HistoryTracker::default();
        record_all(&mut t, "HDMI-1", &["1", "2"]);
        record_all(&mut t, "eDP-1", &["5", "7"]);
        assert!(t.forget_output("HDMI-1"));
        assert!(!t.forget_output("HDMI-1"));
        assert!(t.entries("HDMI-1").is_empty());
        let snap = t.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["eDP-1"], vec!["5".to_string(), "7".to_string()]);
    }
}
