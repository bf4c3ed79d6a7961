//! Choosing the output the focused workspace moves to.

use crate::error::EngineError;
use crate::registry::Registry;

/// Where `toggle` should send the focused workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTarget {
    /// The workspace being moved.
    pub workspace: String,
    /// The output it currently lives on.
    pub from: String,
    /// The output it moves to.
    pub to: String,
}

/// The next output after the current one, in native order, wrapping around.
///
/// Returns `Ok(None)` when only one output exists: there is nowhere to go.
pub fn toggle_target(registry: &Registry) -> Result<Option<ToggleTarget>, EngineError> {
    let workspace = registry.focused_workspace()?;
    let current = registry.current_output()?;
    let outputs: Vec<&str> = registry.outputs().collect();
    if outputs.len() < 2 {
        return Ok(None);
    }

    let idx = outputs
        .iter()
        .position(|o| *o == current)
        .ok_or(EngineError::NoFocus)?;
    let to = outputs[(idx + 1) % outputs.len()];
    Ok(Some(ToggleTarget {
        workspace: workspace.to_string(),
        from: current.to_string(),
        to: to.to_string(),
    }))
}
