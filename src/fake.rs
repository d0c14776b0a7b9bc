//! In-memory stand-ins for the document, the workspace and the timer queue.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use crate::css::STYLESHEET_ID;
use crate::dom::Dom;
use crate::error::{Result, StylingError};
use crate::host::{Scheduler, ViewState, Workspace, WorkspaceEvent};
use crate::mode::SOURCE_MODE;

#[derive(Debug)]
struct Node {
    classes: RefCell<BTreeSet<String>>,
}

#[derive(Clone, Debug)]
pub struct FakeElement(Rc<Node>);

impl FakeElement {
    fn new() -> Self {
        Self(Rc::new(Node {
            classes: RefCell::new(BTreeSet::new()),
        }))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.classes.borrow().contains(class)
    }
}

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug)]
struct Sheet {
    id: String,
    text: RefCell<String>,
}

#[derive(Clone, Debug)]
pub struct FakeSheet(Rc<Sheet>);

pub struct FakeDom {
    body: Option<FakeElement>,
    containers: RefCell<Vec<(String, FakeElement)>>,
    head: RefCell<Vec<FakeSheet>>,
    text_writes: Cell<usize>,
    class_writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::build(Some(FakeElement::new()))
    }

    pub fn without_body() -> Self {
        Self::build(None)
    }

    fn build(body: Option<FakeElement>) -> Self {
        Self {
            body,
            containers: RefCell::new(Vec::new()),
            head: RefCell::new(Vec::new()),
            text_writes: Cell::new(0),
            class_writes: Cell::new(0),
            fail_writes: Cell::new(false),
        }
    }

    pub fn body_element(&self) -> FakeElement {
        self.body.clone().expect("fake document has a body")
    }

    pub fn insert_container(&self, selector: &str) -> FakeElement {
        let element = FakeElement::new();
        self.containers
            .borrow_mut()
            .push((selector.to_string(), element.clone()));
        element
    }

    pub fn container(&self, selector: &str) -> Option<FakeElement> {
        self.query_selector(selector)
    }

    pub fn stylesheet_count(&self) -> usize {
        self.head.borrow().len()
    }

    pub fn stylesheet_text(&self) -> Option<String> {
        self.head
            .borrow()
            .iter()
            .find(|sheet| sheet.0.id == STYLESHEET_ID)
            .map(|sheet| sheet.0.text.borrow().clone())
    }

    /// Simulates the host rebuilding `<head>`.
    pub fn detach_stylesheets(&self) {
        self.head.borrow_mut().clear();
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn text_writes(&self) -> usize {
        self.text_writes.get()
    }

    pub fn class_writes(&self) -> usize {
        self.class_writes.get()
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.get() {
            return Err(StylingError::Dom("write rejected".to_string()));
        }
        Ok(())
    }
}

impl Dom for FakeDom {
    type Element = FakeElement;
    type Stylesheet = FakeSheet;

    fn query_selector(&self, selector: &str) -> Option<FakeElement> {
        self.containers
            .borrow()
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, element)| element.clone())
    }

    fn body(&self) -> Option<FakeElement> {
        self.body.clone()
    }

    fn has_class(&self, element: &FakeElement, class: &str) -> bool {
        element.has_class(class)
    }

    fn add_class(&self, element: &FakeElement, class: &str) -> Result<()> {
        self.check_write()?;
        self.class_writes.set(self.class_writes.get() + 1);
        element.0.classes.borrow_mut().insert(class.to_string());
        Ok(())
    }

    fn remove_class(&self, element: &FakeElement, class: &str) -> Result<()> {
        self.check_write()?;
        self.class_writes.set(self.class_writes.get() + 1);
        element.0.classes.borrow_mut().remove(class);
        Ok(())
    }

    fn find_stylesheet(&self, id: &str) -> Option<FakeSheet> {
        self.head
            .borrow()
            .iter()
            .find(|sheet| sheet.0.id == id)
            .cloned()
    }

    fn create_stylesheet(&self, id: &str) -> Result<FakeSheet> {
        self.check_write()?;
        let sheet = FakeSheet(Rc::new(Sheet {
            id: id.to_string(),
            text: RefCell::new(String::new()),
        }));
        self.head.borrow_mut().push(sheet.clone());
        Ok(sheet)
    }

    fn set_stylesheet_text(&self, sheet: &FakeSheet, css: &str) -> Result<()> {
        self.check_write()?;
        self.text_writes.set(self.text_writes.get() + 1);
        *sheet.0.text.borrow_mut() = css.to_string();
        Ok(())
    }

    fn is_attached(&self, sheet: &FakeSheet) -> bool {
        self.head
            .borrow()
            .iter()
            .any(|attached| Rc::ptr_eq(&attached.0, &sheet.0))
    }

    fn remove_stylesheet(&self, sheet: &FakeSheet) -> Result<()> {
        self.check_write()?;
        self.head
            .borrow_mut()
            .retain(|attached| !Rc::ptr_eq(&attached.0, &sheet.0));
        Ok(())
    }
}

pub struct FakeWorkspace {
    active: RefCell<Option<ViewState>>,
    handlers: RefCell<Vec<(u64, WorkspaceEvent, Rc<dyn Fn()>)>>,
    next_id: Cell<u64>,
    queries: Cell<usize>,
    fail_subscribe_after: Cell<Option<usize>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self {
            active: RefCell::new(None),
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            queries: Cell::new(0),
            fail_subscribe_after: Cell::new(None),
        }
    }

    pub fn set_active(&self, state: Option<ViewState>) {
        *self.active.borrow_mut() = state;
    }

    pub fn set_source_mode(&self) {
        self.set_active(Some(ViewState {
            source: Some(true),
            mode: Some(SOURCE_MODE.to_string()),
        }));
    }

    pub fn set_preview_mode(&self) {
        self.set_active(Some(ViewState {
            source: Some(false),
            mode: Some("preview".to_string()),
        }));
    }

    /// Calls every handler subscribed to `event`.
    pub fn emit(&self, event: WorkspaceEvent) {
        let handlers: Vec<Rc<dyn Fn()>> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    /// Rejects subscriptions once `accepted` are registered. `None` accepts all.
    pub fn fail_subscribe_after(&self, accepted: Option<usize>) {
        self.fail_subscribe_after.set(accepted);
    }

    pub fn subscription_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl Workspace for FakeWorkspace {
    type Subscription = u64;

    fn active_view_state(&self) -> Option<ViewState> {
        self.queries.set(self.queries.get() + 1);
        self.active.borrow().clone()
    }

    fn subscribe(&self, event: WorkspaceEvent, handler: Rc<dyn Fn()>) -> Result<u64> {
        if let Some(accepted) = self.fail_subscribe_after.get() {
            if self.subscription_count() >= accepted {
                return Err(StylingError::HostValue(format!(
                    "workspace.on({}) threw",
                    event.name()
                )));
            }
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, event, handler));
        Ok(id)
    }

    fn unsubscribe(&self, subscription: u64) {
        self.handlers
            .borrow_mut()
            .retain(|(id, _, _)| *id != subscription);
    }
}

/// Holds deferred tasks until the test runs them.
pub struct ManualScheduler {
    tasks: RefCell<Vec<(Duration, Box<dyn FnOnce()>)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(Vec::new()),
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Runs everything queued so far, shortest delay first.
    pub fn run_pending(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        tasks.sort_by_key(|(delay, _)| *delay);
        for (_, task) in tasks {
            task();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push((delay, task));
    }
}
