//! The output registry.
//!
//! A [`Registry`] is the daemon's (and every one-shot command's) view of
//! which outputs exist, which workspaces each of them hosts, and where focus
//! is.  It is rebuilt from a window-manager [`Snapshot`] via
//! [`Registry::refresh`] and never invents workspaces on its own.
//!
//! Two notions of focus are kept apart:
//!
//! * the **global focus**: the single workspace receiving input, and
//! * the **visible workspace** of each output: what that output currently
//!   shows, which an unfocused output keeps remembering.

use crate::command::Snapshot;
use crate::error::EngineError;
use log::debug;

/// One output and the workspaces it hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    /// Connector name.
    pub name: String,
    /// Workspace names in native order (by workspace number).
    pub workspaces: Vec<String>,
    /// Workspace currently shown on this output.
    pub visible: Option<String>,
}

/// Outputs that appeared or vanished during a [`Registry::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryChange {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl RegistryChange {
    /// Whether the set of outputs stayed the same.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Current outputs, their workspaces and the focus state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    outputs: Vec<OutputEntry>,
    focused: Option<String>,
}

/// Pseudo outputs (i3's `__i3` scratchpad container) are not real displays.
fn is_pseudo_output(name: &str) -> bool {
    name.starts_with("__")
}

impl Registry {
    /// An empty registry with no outputs and no focus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry directly from a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut registry = Self::new();
        registry.refresh(snapshot);
        registry
    }

    /// Re-synchronise with `snapshot`, replacing all previous state.
    ///
    /// Outputs keep the window manager's order.  Inactive and pseudo outputs
    /// are skipped.  A workspace whose output is missing from the output
    /// list still gets an entry, appended after the listed outputs.
    pub fn refresh(&mut self, snapshot: &Snapshot) -> RegistryChange {
        let mut outputs: Vec<OutputEntry> = snapshot
            .outputs
            .iter()
            .filter(|o| o.active && !is_pseudo_output(&o.name))
            .map(|o| OutputEntry {
                name: o.name.clone(),
                workspaces: Vec::new(),
                visible: o.current_workspace.clone(),
            })
            .collect();

        let mut ordered: Vec<_> = snapshot
            .workspaces
            .iter()
            .filter(|w| !is_pseudo_output(&w.output))
            .collect();
        // Stable: unnumbered workspaces keep their relative order, after the
        // numbered ones.
        ordered.sort_by_key(|w| if w.num < 0 { i64::MAX } else { w.num as i64 });

        let mut focused = None;
        for ws in ordered {
            let idx = match outputs.iter().position(|o| o.name == ws.output) {
                Some(idx) => idx,
                None => {
                    debug!("workspace {} on unlisted output {}", ws.name, ws.output);
                    outputs.push(OutputEntry {
                        name: ws.output.clone(),
                        workspaces: Vec::new(),
                        visible: None,
                    });
                    outputs.len() - 1
                }
            };
            let entry = &mut outputs[idx];
            entry.workspaces.push(ws.name.clone());
            if ws.visible && entry.visible.is_none() {
                entry.visible = Some(ws.name.clone());
            }
            if ws.focused {
                focused = Some(ws.name.clone());
            }
        }

        let change = RegistryChange {
            added: outputs
                .iter()
                .filter(|o| self.output(&o.name).is_none())
                .map(|o| o.name.clone())
                .collect(),
            removed: self
                .outputs
                .iter()
                .filter(|old| !outputs.iter().any(|o| o.name == old.name))
                .map(|o| o.name.clone())
                .collect(),
        };

        self.outputs = outputs;
        self.focused = focused;
        change
    }

    /// The globally focused workspace.
    pub fn focused_workspace(&self) -> Result<&str, EngineError> {
        self.focused.as_deref().ok_or(EngineError::NoFocus)
    }

    /// The output hosting the globally focused workspace.
    pub fn current_output(&self) -> Result<&str, EngineError> {
        let focused = self.focused_workspace()?;
        self.output_of(focused).ok_or(EngineError::NoFocus)
    }

    /// Workspaces on `output` in native order.  Empty for unknown outputs.
    pub fn workspaces_on(&self, output: &str) -> &[String] {
        self.output(output)
            .map(|o| o.workspaces.as_slice())
            .unwrap_or(&[])
    }

    /// The workspace `output` currently shows, focused or not.
    pub fn visible_on(&self, output: &str) -> Option<&str> {
        self.output(output).and_then(|o| o.visible.as_deref())
    }

    /// Output names in native order.
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.name.as_str())
    }

    /// Number of known outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Look up the entry for `name`.
    pub fn output(&self, name: &str) -> Option<&OutputEntry> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// The output `workspace` is assigned to.
    pub fn output_of(&self, workspace: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.workspaces.iter().any(|w| w == workspace))
            .map(|o| o.name.as_str())
    }

    /// Whether `workspace` currently lives on `output`.
    pub fn contains(&self, output: &str, workspace: &str) -> bool {
        self.workspaces_on(output).iter().any(|w| w == workspace)
    }
}
