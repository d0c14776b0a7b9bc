use std::rc::Rc;

use crate::css::STYLESHEET_ID;
use crate::dom::Dom;
use crate::error::Result;

struct AppliedSheet<S> {
    element: S,
    css: String,
}

/// Owns the one `<style>` element the styling writes into.
pub struct StyleInjector<D: Dom> {
    dom: Rc<D>,
    applied: Option<AppliedSheet<D::Stylesheet>>,
}

impl<D: Dom> StyleInjector<D> {
    pub fn new(dom: Rc<D>) -> Self {
        Self { dom, applied: None }
    }

    pub fn is_applied(&self) -> bool {
        self.applied.is_some()
    }

    pub fn apply(&mut self, css: &str) -> Result<()> {
        // The host may have detached our element while re-rendering.
        if let Some(applied) = &self.applied {
            if !self.dom.is_attached(&applied.element) {
                tracing::debug!("stylesheet detached by host, re-acquiring");
                self.applied = None;
            }
        }

        if let Some(applied) = &mut self.applied {
            if applied.css != css {
                self.dom.set_stylesheet_text(&applied.element, css)?;
                applied.css = css.to_string();
            }
            return Ok(());
        }

        let element = match self.dom.find_stylesheet(STYLESHEET_ID) {
            Some(existing) => existing,
            None => self.dom.create_stylesheet(STYLESHEET_ID)?,
        };
        self.dom.set_stylesheet_text(&element, css)?;
        self.applied = Some(AppliedSheet {
            element,
            css: css.to_string(),
        });
        Ok(())
    }

    /// Removes the stylesheet. Safe to call when nothing was applied.
    pub fn remove_all(&mut self) -> Result<()> {
        if let Some(applied) = self.applied.take() {
            if self.dom.is_attached(&applied.element) {
                self.dom.remove_stylesheet(&applied.element)?;
            }
        }
        // A sheet left behind by an earlier load of the plugin carries the same id.
        if let Some(stray) = self.dom.find_stylesheet(STYLESHEET_ID) {
            self.dom.remove_stylesheet(&stray)?;
        }
        Ok(())
    }
}
