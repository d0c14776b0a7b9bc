use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::set_timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::coordinator::StylingCoordinator;
use crate::dom::Dom;
use crate::error::{Result, StylingError};
use crate::host::{Scheduler, ViewState, Workspace, WorkspaceEvent};
use crate::logging;
use crate::settings::StylingSettings;

#[wasm_bindgen]
extern "C" {
    /// The host application's `app.workspace`.
    pub type HostWorkspace;

    // Every binding catches: the host's objects are not ours and may throw.
    #[wasm_bindgen(method, catch)]
    fn on(
        this: &HostWorkspace,
        name: &str,
        callback: &js_sys::Function,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn offref(this: &HostWorkspace, event_ref: &JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, getter, catch, js_name = activeLeaf)]
    fn active_leaf(this: &HostWorkspace) -> std::result::Result<Option<WorkspaceLeaf>, JsValue>;

    type WorkspaceLeaf;

    #[wasm_bindgen(method, getter, catch)]
    fn view(this: &WorkspaceLeaf) -> std::result::Result<Option<View>, JsValue>;

    type View;

    #[wasm_bindgen(method, catch, js_name = getViewType)]
    fn view_type(this: &View) -> std::result::Result<String, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getState)]
    fn state(this: &View) -> std::result::Result<JsValue, JsValue>;
}

const MARKDOWN_VIEW: &str = "markdown";

fn js_message(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn dom_error(err: JsValue) -> StylingError {
    StylingError::Dom(js_message(&err))
}

pub struct WebDom {
    document: web_sys::Document,
}

impl WebDom {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(StylingError::HostUnavailable("window"))?;
        let document = window
            .document()
            .ok_or(StylingError::HostUnavailable("document"))?;
        if document.head().is_none() {
            return Err(StylingError::HostUnavailable("document head"));
        }
        Ok(Self { document })
    }
}

impl Dom for WebDom {
    type Element = web_sys::Element;
    type Stylesheet = web_sys::Element;

    fn query_selector(&self, selector: &str) -> Option<web_sys::Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn body(&self) -> Option<web_sys::Element> {
        self.document.body().map(Into::into)
    }

    fn has_class(&self, element: &web_sys::Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn add_class(&self, element: &web_sys::Element, class: &str) -> Result<()> {
        element.class_list().add_1(class).map_err(dom_error)
    }

    fn remove_class(&self, element: &web_sys::Element, class: &str) -> Result<()> {
        element.class_list().remove_1(class).map_err(dom_error)
    }

    fn find_stylesheet(&self, id: &str) -> Option<web_sys::Element> {
        self.document.get_element_by_id(id)
    }

    fn create_stylesheet(&self, id: &str) -> Result<web_sys::Element> {
        let head = self
            .document
            .head()
            .ok_or(StylingError::HostUnavailable("document head"))?;
        let style = self.document.create_element("style").map_err(dom_error)?;
        style.set_id(id);
        head.append_child(&style).map_err(dom_error)?;
        Ok(style)
    }

    fn set_stylesheet_text(&self, sheet: &web_sys::Element, css: &str) -> Result<()> {
        sheet.set_text_content(Some(css));
        Ok(())
    }

    fn is_attached(&self, sheet: &web_sys::Element) -> bool {
        sheet.is_connected()
    }

    fn remove_stylesheet(&self, sheet: &web_sys::Element) -> Result<()> {
        sheet.remove();
        Ok(())
    }
}

pub struct WebSubscription {
    event_ref: JsValue,
    _callback: Closure<dyn FnMut()>,
}

pub struct WebWorkspace {
    workspace: HostWorkspace,
}

impl WebWorkspace {
    pub fn new(workspace: HostWorkspace) -> Self {
        Self { workspace }
    }

    fn markdown_view_state(&self) -> std::result::Result<Option<JsValue>, JsValue> {
        let Some(leaf) = self.workspace.active_leaf()? else {
            return Ok(None);
        };
        let Some(view) = leaf.view()? else {
            return Ok(None);
        };
        if view.view_type()? != MARKDOWN_VIEW {
            return Ok(None);
        }
        view.state().map(Some)
    }
}

impl Workspace for WebWorkspace {
    type Subscription = WebSubscription;

    fn active_view_state(&self) -> Option<ViewState> {
        let state = match self.markdown_view_state() {
            Ok(state) => state?,
            Err(err) => {
                let err = js_message(&err);
                tracing::warn!(%err, "active view unreadable, treating as none");
                return None;
            }
        };
        match serde_wasm_bindgen::from_value(state) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(%err, "unreadable view state");
                None
            }
        }
    }

    fn subscribe(&self, event: WorkspaceEvent, handler: Rc<dyn Fn()>) -> Result<WebSubscription> {
        let callback = Closure::<dyn FnMut()>::new(move || handler());
        let event_ref = self
            .workspace
            .on(event.name(), callback.as_ref().unchecked_ref())
            .map_err(|err| {
                let message = js_message(&err);
                StylingError::HostValue(format!("workspace.on({}): {message}", event.name()))
            })?;
        Ok(WebSubscription {
            event_ref,
            _callback: callback,
        })
    }

    fn unsubscribe(&self, subscription: WebSubscription) {
        if let Err(err) = self.workspace.offref(&subscription.event_ref) {
            let err = js_message(&err);
            tracing::warn!(%err, "workspace.offref failed");
        }
    }
}

pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        set_timeout(task, delay);
    }
}

fn settings_from_js(value: JsValue) -> Result<StylingSettings> {
    if value.is_null() || value.is_undefined() {
        return Ok(StylingSettings::default());
    }
    let raw: serde_json::Value = serde_wasm_bindgen::from_value(value)
        .map_err(|err| StylingError::HostValue(err.to_string()))?;
    StylingSettings::from_value(raw)
}

fn settings_to_js(settings: &StylingSettings) -> Result<JsValue> {
    serde_wasm_bindgen::to_value(settings).map_err(|err| StylingError::HostValue(err.to_string()))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init();
}

/// Resolves the host's `loadData()` promise into complete, sanitized settings.
#[wasm_bindgen(js_name = loadSettings)]
pub async fn load_settings(data: js_sys::Promise) -> std::result::Result<JsValue, JsError> {
    let raw = JsFuture::from(data)
        .await
        .map_err(|err| StylingError::HostValue(js_message(&err)))?;
    let settings = settings_from_js(raw)?.sanitized();
    Ok(settings_to_js(&settings)?)
}

type WebCoordinator = StylingCoordinator<WebDom, WebWorkspace, TimeoutScheduler>;

/// Plugin object handed to the JavaScript shell.
#[wasm_bindgen]
pub struct SourceModeStyling {
    coordinator: WebCoordinator,
}

#[wasm_bindgen]
impl SourceModeStyling {
    #[wasm_bindgen(constructor)]
    pub fn new(
        workspace: HostWorkspace,
        settings: JsValue,
    ) -> std::result::Result<SourceModeStyling, JsError> {
        let settings = settings_from_js(settings)?;
        let dom = WebDom::new()?;
        let coordinator = StylingCoordinator::new(
            Rc::new(dom),
            Rc::new(WebWorkspace::new(workspace)),
            Rc::new(TimeoutScheduler),
            settings,
        );
        Ok(Self { coordinator })
    }

    /// Starts styling if the settings have it switched on.
    pub fn load(&self) -> std::result::Result<(), JsError> {
        if self.coordinator.settings().enabled {
            self.coordinator.enable()?;
        }
        Ok(())
    }

    pub fn unload(&self) {
        self.coordinator.disable();
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.coordinator.is_enabled()
    }

    #[wasm_bindgen(js_name = setEnabled)]
    pub fn set_enabled(&self, enabled: bool) -> std::result::Result<(), JsError> {
        let mut settings = self.coordinator.settings();
        settings.enabled = enabled;
        self.apply(settings)
    }

    #[wasm_bindgen(js_name = updateSettings)]
    pub fn update_settings(&self, settings: JsValue) -> std::result::Result<(), JsError> {
        let settings = settings_from_js(settings)?;
        self.apply(settings)
    }

    /// Current settings, ready for the host's `saveData()`.
    pub fn settings(&self) -> std::result::Result<JsValue, JsError> {
        Ok(settings_to_js(&self.coordinator.settings())?)
    }

    /// Takes the font probe's result and swaps in an installed font if needed.
    #[wasm_bindgen(js_name = applyAvailableFonts)]
    pub fn apply_available_fonts(&self, fonts: Vec<String>) {
        let settings = self.coordinator.settings().with_available_fonts(&fonts);
        self.coordinator.update_settings(settings);
    }

    pub fn refresh(&self) {
        self.coordinator.refresh();
    }
}

impl SourceModeStyling {
    fn apply(&self, settings: StylingSettings) -> std::result::Result<(), JsError> {
        let enabled = settings.enabled;
        self.coordinator.update_settings(settings);
        if enabled {
            self.coordinator.enable()?;
        } else {
            self.coordinator.disable();
        }
        Ok(())
    }
}
