use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Workspace notifications the coordinator listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkspaceEvent {
    ActiveLeafChange,
    LayoutChange,
    FileOpen,
}

impl WorkspaceEvent {
    pub const ALL: [WorkspaceEvent; 3] = [
        WorkspaceEvent::ActiveLeafChange,
        WorkspaceEvent::LayoutChange,
        WorkspaceEvent::FileOpen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WorkspaceEvent::ActiveLeafChange => "active-leaf-change",
            WorkspaceEvent::LayoutChange => "layout-change",
            WorkspaceEvent::FileOpen => "file-open",
        }
    }

    /// How long the host usually needs to finish re-rendering after firing this event.
    pub fn settle_delay(self) -> Duration {
        match self {
            WorkspaceEvent::ActiveLeafChange | WorkspaceEvent::LayoutChange => {
                Duration::from_millis(50)
            }
            WorkspaceEvent::FileOpen => Duration::from_millis(100),
        }
    }
}

/// What the active editor view reports about itself. Fields the host leaves out stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub source: Option<bool>,
    #[serde(default)]
    pub mode: Option<String>,
}

pub trait Workspace {
    type Subscription;

    /// State of the active markdown editor view, `None` when no editor is active
    /// or the host could not be read.
    fn active_view_state(&self) -> Option<ViewState>;
    fn subscribe(&self, event: WorkspaceEvent, handler: Rc<dyn Fn()>) -> Result<Self::Subscription>;
    fn unsubscribe(&self, subscription: Self::Subscription);
}

/// Runs a task once, later.
pub trait Scheduler {
    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>);
}
