//! Cycling through the workspaces of the focused output.

use crate::command::Direction;
use crate::error::EngineError;
use crate::registry::Registry;

/// The workspace to focus when cycling in `direction` on the current output.
///
/// Wraps from the last workspace to the first and vice versa.  A focused
/// workspace missing from its output's list (the registry is mid-update)
/// is treated as sitting at index 0.
pub fn cycle(registry: &Registry, direction: Direction) -> Result<&str, EngineError> {
    let output = registry.current_output()?;
    let focused = registry.focused_workspace()?;
    let workspaces = registry.workspaces_on(output);
    let n = workspaces.len();
    if n == 0 {
        return Err(EngineError::NoWorkspaces {
            output: output.to_string(),
        });
    }

    let idx = workspaces.iter().position(|w| w == focused).unwrap_or(0);
    let target = match direction {
        Direction::Forward => (idx + 1) % n,
        Direction::Backward => (idx + n - 1) % n,
    };
    Ok(&workspaces[target])
}
