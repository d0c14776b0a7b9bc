//! Turns [`StylingSettings`] into the stylesheet injected for raw source mode.
//!
//! Every rule is scoped under [`MARKER_CLASS`], so the CSS only takes effect
//! while the coordinator has marked a container. Fields left on the theme
//! sentinel produce no declaration at all.

use regex::Regex;
use std::sync::OnceLock;

use crate::settings::{Setting, StylingSettings, THEME};

/// Class toggled on the resolved container while the active view is in raw source mode.
pub const MARKER_CLASS: &str = "source-mode-raw";

/// Id of the single `<style>` element owned by the injector.
pub const STYLESHEET_ID: &str = "sourcemode-styling-font-style";

const EDITOR_SCOPE: &str = ".markdown-source-view.mod-cm6:not(.is-live-preview)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub property: &'static str,
    pub value: String,
}

impl Declaration {
    fn new(property: &'static str, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }
}

/// Declarations for the editor body and for headings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleRules {
    pub editor: Vec<Declaration>,
    pub headings: Vec<Declaration>,
}

impl StyleRules {
    pub fn is_empty(&self) -> bool {
        self.editor.is_empty() && self.headings.is_empty()
    }

    pub fn to_css(&self) -> String {
        let mut css = String::new();
        push_rule(&mut css, "cm-scroller", &self.editor);
        push_rule(&mut css, "cm-header", &self.headings);
        css
    }
}

fn push_rule(css: &mut String, target: &str, declarations: &[Declaration]) {
    if declarations.is_empty() {
        return;
    }
    css.push_str(&format!(".{MARKER_CLASS} {EDITOR_SCOPE} .{target} {{\n"));
    for declaration in declarations {
        css.push_str(&format!("  {}: {};\n", declaration.property, declaration.value));
    }
    css.push_str("}\n");
}

pub fn generate(settings: &StylingSettings) -> StyleRules {
    let mut editor = Vec::new();
    if let Some(family) = font_family(&settings.font_family) {
        editor.push(Declaration::new("font-family", family));
    }
    if let Some(size) = positive_number(&settings.font_size) {
        editor.push(Declaration::new("font-size", format!("{size}px")));
    }
    if let Some(line_height) = positive_number(&settings.line_height) {
        editor.push(Declaration::new("line-height", line_height.to_string()));
    }
    if let Setting::Value(weight) = settings.font_weight {
        editor.push(Declaration::new("font-weight", weight.css_value().to_string()));
    }
    if let Some(color) = color(&settings.font_color) {
        editor.push(Declaration::new("color", color));
    }
    if let Some(color) = color(&settings.background_color) {
        editor.push(Declaration::new("background-color", color));
    }

    let mut headings = Vec::new();
    if let Some(color) = color(&settings.heading_color) {
        headings.push(Declaration::new("color", color));
    }

    StyleRules { editor, headings }
}

pub fn generate_css(settings: &StylingSettings) -> String {
    generate(settings).to_css()
}

fn font_family(setting: &Setting<String>) -> Option<String> {
    let family = setting.value()?.trim();
    let unsafe_char = |c: char| matches!(c, '"' | '\\' | ';' | '{' | '}' | '<' | '>' | '\n' | '\r');
    if family.is_empty() || family.eq_ignore_ascii_case(THEME) || family.contains(unsafe_char) {
        return None;
    }
    Some(format!("\"{family}\", monospace"))
}

fn positive_number(setting: &Setting<f64>) -> Option<f64> {
    setting.value().copied().filter(|v| v.is_finite() && *v > 0.0)
}

fn color(setting: &Setting<String>) -> Option<&str> {
    let raw = setting.value()?.trim();
    if raw.eq_ignore_ascii_case(THEME) || !is_color(raw) {
        return None;
    }
    Some(raw)
}

fn is_color(raw: &str) -> bool {
    static RE_HEX: OnceLock<Regex> = OnceLock::new();
    static RE_FUNC: OnceLock<Regex> = OnceLock::new();
    static RE_NAMED: OnceLock<Regex> = OnceLock::new();

    let re_hex = RE_HEX.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
    });
    let re_func = RE_FUNC.get_or_init(|| {
        Regex::new(r"^(?:rgba?|hsla?|hwb|lab|lch|oklab|oklch)\([0-9a-zA-Z.,%/\s+-]*\)$").unwrap()
    });
    let re_named = RE_NAMED.get_or_init(|| Regex::new(r"^[a-zA-Z]+$").unwrap());

    re_hex.is_match(raw) || re_func.is_match(raw) || re_named.is_match(raw)
}
