//! Keeps the marker class and the injected stylesheet in step with the
//! workspace.
//!
//! While enabled, every workspace notification re-resolves the container,
//! re-queries the active view and rewrites the stylesheet from the current
//! settings. Each notification also schedules one deferred re-check, because
//! the host fires some events before it has finished rebuilding the panes.
//! A refresh is a full recomputation, so running it again, late or out of
//! order, converges on the same DOM state.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::css::{self, MARKER_CLASS};
use crate::dom::{resolve_container, Dom};
use crate::error::{Result, StylingError};
use crate::host::{Scheduler, Workspace, WorkspaceEvent};
use crate::injector::StyleInjector;
use crate::mode;
use crate::settings::StylingSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Disabled,
    Enabled,
}

pub struct StylingCoordinator<D, W, S>
where
    D: Dom + 'static,
    W: Workspace + 'static,
    S: Scheduler + 'static,
{
    inner: Rc<RefCell<Inner<D, W, S>>>,
}

struct Inner<D: Dom, W: Workspace, S> {
    dom: Rc<D>,
    workspace: Rc<W>,
    scheduler: Rc<S>,
    settings: StylingSettings,
    lifecycle: Lifecycle,
    // Bumped on every enable/disable so callbacks from an earlier cycle go quiet.
    epoch: u64,
    injector: StyleInjector<D>,
    subscriptions: Vec<W::Subscription>,
    marked: Option<D::Element>,
}

impl<D, W, S> StylingCoordinator<D, W, S>
where
    D: Dom + 'static,
    W: Workspace + 'static,
    S: Scheduler + 'static,
{
    pub fn new(dom: Rc<D>, workspace: Rc<W>, scheduler: Rc<S>, settings: StylingSettings) -> Self {
        let injector = StyleInjector::new(dom.clone());
        Self {
            inner: Rc::new(RefCell::new(Inner {
                dom,
                workspace,
                scheduler,
                settings,
                lifecycle: Lifecycle::Disabled,
                epoch: 0,
                injector,
                subscriptions: Vec::new(),
                marked: None,
            })),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.borrow().lifecycle
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle() == Lifecycle::Enabled
    }

    pub fn settings(&self) -> StylingSettings {
        self.inner.borrow().settings.clone()
    }

    /// Subscribes to the workspace and styles the current view. No-op when already enabled.
    pub fn enable(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.lifecycle == Lifecycle::Enabled {
            return Ok(());
        }
        if resolve_container(&*inner.dom).is_none() {
            return Err(StylingError::HostUnavailable("document body"));
        }

        inner.epoch += 1;
        let epoch = inner.epoch;
        let workspace = inner.workspace.clone();
        let mut subscriptions = Vec::with_capacity(WorkspaceEvent::ALL.len());
        for event in WorkspaceEvent::ALL {
            let handler = notification_handler(
                Rc::downgrade(&self.inner),
                inner.scheduler.clone(),
                event,
                epoch,
            );
            match workspace.subscribe(event, handler) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(err) => {
                    warn!(%err, event = event.name(), "workspace subscription failed");
                    for subscription in subscriptions {
                        workspace.unsubscribe(subscription);
                    }
                    return Err(err);
                }
            }
        }
        inner.subscriptions = subscriptions;
        inner.lifecycle = Lifecycle::Enabled;
        info!(epoch, "source mode styling enabled");

        inner.refresh();
        Ok(())
    }

    /// Unsubscribes and removes every trace of the styling. No-op when already disabled.
    pub fn disable(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.lifecycle == Lifecycle::Disabled {
            return;
        }
        inner.lifecycle = Lifecycle::Disabled;
        inner.epoch += 1;

        let workspace = inner.workspace.clone();
        for subscription in inner.subscriptions.drain(..) {
            workspace.unsubscribe(subscription);
        }

        if let Some(previous) = inner.marked.take() {
            inner.unmark(&previous);
        }
        if let Some(container) = resolve_container(&*inner.dom) {
            inner.unmark(&container);
        }
        if let Err(err) = inner.injector.remove_all() {
            warn!(%err, "failed to remove source mode stylesheet");
        }
        info!("source mode styling disabled");
    }

    /// Replaces the settings. While enabled the stylesheet is rewritten right away;
    /// while disabled they are kept for the next `enable`.
    pub fn update_settings(&self, settings: StylingSettings) {
        let mut inner = self.inner.borrow_mut();
        inner.settings = settings;
        if inner.lifecycle == Lifecycle::Enabled {
            inner.refresh_styles();
        }
    }

    /// Runs one full refresh cycle if enabled.
    pub fn refresh(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.lifecycle == Lifecycle::Enabled {
            inner.refresh();
        }
    }
}

impl<D, W, S> Drop for StylingCoordinator<D, W, S>
where
    D: Dom + 'static,
    W: Workspace + 'static,
    S: Scheduler + 'static,
{
    fn drop(&mut self) {
        self.disable();
    }
}

fn notification_handler<D, W, S>(
    weak: Weak<RefCell<Inner<D, W, S>>>,
    scheduler: Rc<S>,
    event: WorkspaceEvent,
    epoch: u64,
) -> Rc<dyn Fn()>
where
    D: Dom + 'static,
    W: Workspace + 'static,
    S: Scheduler + 'static,
{
    Rc::new(move || {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        refresh_if_current(&inner, epoch, event);

        let weak = weak.clone();
        scheduler.defer(
            event.settle_delay(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    refresh_if_current(&inner, epoch, event);
                }
            }),
        );
    })
}

fn refresh_if_current<D: Dom, W: Workspace, S>(
    cell: &RefCell<Inner<D, W, S>>,
    epoch: u64,
    event: WorkspaceEvent,
) {
    match cell.try_borrow_mut() {
        Ok(mut inner) if inner.lifecycle == Lifecycle::Enabled && inner.epoch == epoch => {
            inner.refresh();
        }
        Ok(_) => debug!(event = event.name(), "dropping refresh from a previous enable cycle"),
        // Re-entered from inside a refresh; a later check covers this one.
        Err(_) => debug!(event = event.name(), "coordinator busy, skipping refresh"),
    }
}

impl<D: Dom, W: Workspace, S> Inner<D, W, S> {
    fn refresh(&mut self) {
        let Some(container) = resolve_container(&*self.dom) else {
            debug!("no container resolved, skipping refresh");
            return;
        };

        // The host may have swapped containers since the last cycle.
        if let Some(previous) = self.marked.take() {
            if previous != container {
                self.unmark(&previous);
            }
        }

        let raw = mode::detect(&*self.workspace);
        if raw {
            self.mark(&container);
            self.marked = Some(container);
        } else {
            self.unmark(&container);
        }
        debug!(raw, "refreshed source mode marker");

        self.refresh_styles();
    }

    fn refresh_styles(&mut self) {
        let css = css::generate_css(&self.settings);
        if let Err(err) = self.injector.apply(&css) {
            warn!(%err, "failed to inject source mode stylesheet");
        }
    }

    fn mark(&self, element: &D::Element) {
        if self.dom.has_class(element, MARKER_CLASS) {
            return;
        }
        if let Err(err) = self.dom.add_class(element, MARKER_CLASS) {
            warn!(%err, "failed to add marker class");
        }
    }

    fn unmark(&self, element: &D::Element) {
        if !self.dom.has_class(element, MARKER_CLASS) {
            return;
        }
        if let Err(err) = self.dom.remove_class(element, MARKER_CLASS) {
            warn!(%err, "failed to remove marker class");
        }
    }
}
