use crate::error::Result;

/// Containers that survive pane re-layout, most specific first. `<body>` is the last resort.
pub const CONTAINER_SELECTORS: [&str; 3] = [
    ".workspace-split.mod-root",
    ".workspace-tabs",
    ".workspace-leaf",
];

/// The slice of the document the styling touches.
pub trait Dom {
    type Element: Clone + PartialEq;
    type Stylesheet;

    fn query_selector(&self, selector: &str) -> Option<Self::Element>;
    fn body(&self) -> Option<Self::Element>;

    fn has_class(&self, element: &Self::Element, class: &str) -> bool;
    fn add_class(&self, element: &Self::Element, class: &str) -> Result<()>;
    fn remove_class(&self, element: &Self::Element, class: &str) -> Result<()>;

    fn find_stylesheet(&self, id: &str) -> Option<Self::Stylesheet>;
    /// Creates a `<style>` element with the given id and attaches it to the document head.
    fn create_stylesheet(&self, id: &str) -> Result<Self::Stylesheet>;
    fn set_stylesheet_text(&self, sheet: &Self::Stylesheet, css: &str) -> Result<()>;
    fn is_attached(&self, sheet: &Self::Stylesheet) -> bool;
    fn remove_stylesheet(&self, sheet: &Self::Stylesheet) -> Result<()>;
}

pub fn resolve_container<D: Dom>(dom: &D) -> Option<D::Element> {
    CONTAINER_SELECTORS
        .iter()
        .find_map(|selector| dom.query_selector(selector))
        .or_else(|| dom.body())
}
