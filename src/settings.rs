use std::ops::RangeInclusive;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StylingError;

/// Sentinel that leaves a property to the app theme.
pub const THEME: &str = "theme";

pub const FONT_SIZE_RANGE: RangeInclusive<f64> = 9.0..=20.0;
pub const LINE_HEIGHT_RANGE: RangeInclusive<f64> = 1.0..=2.5;
pub const NUMERIC_WEIGHT_RANGE: RangeInclusive<u16> = 100..=900;

/// Key older releases saved the on/off toggle under.
const LEGACY_ENABLED_KEY: &str = "rawModeEnabled";

/// Fonts offered to the availability probe, in display order.
pub const MONOSPACE_FONTS: &[&str] = &[
    "Andale Mono",
    "Anonymous Pro",
    "Bitstream Vera Sans Mono",
    "Cascadia Code",
    "Cascadia Mono",
    "Code New Roman",
    "Consolas",
    "Courier New",
    "Courier Prime",
    "DejaVu Sans Mono",
    "Droid Sans Mono",
    "Fira Code",
    "Fira Mono",
    "Hack",
    "IBM Plex Mono",
    "Inconsolata",
    "JetBrains Mono",
    "Liberation Mono",
    "Menlo",
    "Monaco",
    "Noto Mono",
    "Red Hat Mono",
    "Roboto Mono",
    "Source Code Pro",
    "Space Mono",
    "Ubuntu Mono",
    "monospace",
];

/// A single visual override: either defer to the theme or force a value.
#[derive(Clone, Debug, PartialEq)]
pub enum Setting<T> {
    Theme,
    Value(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Theme
    }
}

impl<T> Setting<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Setting::Theme => None,
            Setting::Value(value) => Some(value),
        }
    }

    pub fn is_theme(&self) -> bool {
        matches!(self, Setting::Theme)
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Setting::Theme => serializer.serialize_str(THEME),
            Setting::Value(value) => value.serialize(serializer),
        }
    }
}

// Anything that is not a valid value for the field falls back to the theme,
// so one bad key never rejects the whole settings document.
impl<'de, T: DeserializeOwned> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        if raw.as_str() == Some(THEME) {
            return Ok(Setting::Theme);
        }
        Ok(serde_json::from_value(raw)
            .map(Setting::Value)
            .unwrap_or(Setting::Theme))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Light,
    Semibold,
    Bold,
    Numeric(u16),
}

impl FontWeight {
    pub fn numeric(weight: u16) -> Option<Self> {
        NUMERIC_WEIGHT_RANGE
            .contains(&weight)
            .then_some(FontWeight::Numeric(weight))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "normal" => Some(FontWeight::Normal),
            "light" => Some(FontWeight::Light),
            "semibold" => Some(FontWeight::Semibold),
            "bold" => Some(FontWeight::Bold),
            other => other.parse::<u16>().ok().and_then(Self::numeric),
        }
    }

    /// Unitless CSS `font-weight` value.
    pub fn css_value(self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Light => 200,
            FontWeight::Semibold => 600,
            FontWeight::Bold => 700,
            FontWeight::Numeric(weight) => weight,
        }
    }

    fn keyword(self) -> Option<&'static str> {
        match self {
            FontWeight::Normal => Some("normal"),
            FontWeight::Light => Some("light"),
            FontWeight::Semibold => Some("semibold"),
            FontWeight::Bold => Some("bold"),
            FontWeight::Numeric(_) => None,
        }
    }
}

impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.keyword() {
            Some(keyword) => serializer.serialize_str(keyword),
            None => serializer.serialize_u16(self.css_value()),
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let parsed = match &raw {
            Value::String(s) => FontWeight::parse(s),
            // JS numbers arrive as floats through serde-wasm-bindgen.
            Value::Number(n) => n
                .as_f64()
                .filter(|w| w.fract() == 0.0 && *w >= 0.0 && *w <= f64::from(u16::MAX))
                .and_then(|w| FontWeight::numeric(w as u16)),
            _ => None,
        };
        parsed.ok_or_else(|| D::Error::custom(format!("invalid font weight: {raw}")))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylingSettings {
    #[serde(deserialize_with = "lenient_enabled")]
    pub enabled: bool,
    pub font_family: Setting<String>,
    pub font_size: Setting<f64>,
    pub line_height: Setting<f64>,
    pub font_color: Setting<String>,
    pub heading_color: Setting<String>,
    pub background_color: Setting<String>,
    pub font_weight: Setting<FontWeight>,
}

impl Default for StylingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            font_family: Setting::Value("Source Code Pro".to_string()),
            font_size: Setting::Value(14.0),
            line_height: Setting::Value(1.75),
            font_color: Setting::Theme,
            heading_color: Setting::Value("#2d5b8c".to_string()),
            background_color: Setting::Theme,
            font_weight: Setting::Theme,
        }
    }
}

impl StylingSettings {
    /// Every visual field set to the theme sentinel.
    pub fn all_theme() -> Self {
        Self {
            enabled: true,
            font_family: Setting::Theme,
            font_size: Setting::Theme,
            line_height: Setting::Theme,
            font_color: Setting::Theme,
            heading_color: Setting::Theme,
            background_color: Setting::Theme,
            font_weight: Setting::Theme,
        }
    }

    /// Defaults merged with persisted data. `null` (nothing saved yet) yields the defaults.
    pub fn from_value(mut raw: Value) -> Result<Self, StylingError> {
        if raw.is_null() {
            return Ok(Self::default());
        }
        if let Some(object) = raw.as_object_mut() {
            // `enabled` wins when both keys were saved.
            if let Some(legacy) = object.remove(LEGACY_ENABLED_KEY) {
                object.entry("enabled").or_insert(legacy);
            }
        }
        Ok(serde_json::from_value(raw)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StylingError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StylingError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Drops numeric overrides outside the ranges the settings panel allows.
    pub fn sanitized(&self) -> Self {
        let mut next = self.clone();
        next.font_size = within(&self.font_size, &FONT_SIZE_RANGE);
        next.line_height = within(&self.line_height, &LINE_HEIGHT_RANGE);
        next
    }

    /// Falls back to the first probed font when the configured one is not installed.
    pub fn with_available_fonts(&self, available: &[String]) -> Self {
        let mut next = self.clone();
        if let (Setting::Value(family), Some(first)) = (&self.font_family, available.first()) {
            if !available.iter().any(|font| font == family) {
                tracing::info!(configured = %family, fallback = %first, "configured font not available");
                next.font_family = Setting::Value(first.clone());
            }
        }
        next
    }
}

fn lenient_enabled<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw
        .as_bool()
        .unwrap_or_else(|| StylingSettings::default().enabled))
}

fn within(setting: &Setting<f64>, range: &RangeInclusive<f64>) -> Setting<f64> {
    match setting {
        Setting::Value(v) if v.is_finite() && range.contains(v) => Setting::Value(*v),
        _ => Setting::Theme,
    }
}
