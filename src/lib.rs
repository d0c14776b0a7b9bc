//! Gives the raw source editing mode its own font and colors.
//!
//! The [`StylingCoordinator`] watches the host workspace, toggles
//! [`MARKER_CLASS`] on a persistent container while the active editor is in
//! source mode, and keeps one injected stylesheet in sync with the
//! [`StylingSettings`]. The browser bindings live in [`web`]; everything else
//! talks to the host through the [`Dom`], [`Workspace`] and [`Scheduler`]
//! traits.

pub mod coordinator;
pub mod css;
pub mod dom;
pub mod error;
pub mod host;
pub mod injector;
pub mod logging;
pub mod mode;
pub mod settings;
pub mod web;

#[cfg(test)]
mod fake;

pub use coordinator::{Lifecycle, StylingCoordinator};
pub use css::{generate, generate_css, StyleRules, MARKER_CLASS, STYLESHEET_ID};
pub use dom::{resolve_container, Dom, CONTAINER_SELECTORS};
pub use error::{Result, StylingError};
pub use host::{Scheduler, ViewState, Workspace, WorkspaceEvent};
pub use injector::StyleInjector;
pub use mode::{is_raw_mode, SOURCE_MODE};
pub use settings::{FontWeight, Setting, StylingSettings, MONOSPACE_FONTS, THEME};
