use crate::host::{ViewState, Workspace};

/// `mode` value of an editor showing unrendered markdown (as opposed to `"preview"`).
pub const SOURCE_MODE: &str = "source";

pub fn is_raw_mode(state: Option<&ViewState>) -> bool {
    state.is_some_and(|state| {
        state.source == Some(true) && state.mode.as_deref() == Some(SOURCE_MODE)
    })
}

/// Queries the host every time; the active view changes independently of notifications.
pub fn detect<W: Workspace>(workspace: &W) -> bool {
    is_raw_mode(workspace.active_view_state().as_ref())
}
