//! Opaque theme option documents.
//!
//! A [`ThemeOptions`] value holds the style-token document of a theme
//! (palette, typography, shape, component overrides). The document is kept
//! as a tagged recursive value and is never interpreted here, except for the
//! dot-path helpers used by structured field editing and the `palette.mode`
//! lookup used for mode toggling.
//!
//! # Example
//!
//! ```rust
//! use theme_manager::document::ThemeOptions;
//!
//! let options = ThemeOptions::new().with_value("palette.primary.main", "#ff0000");
//! assert_eq!(options.get_str("palette.primary.main", "#000000"), "#ff0000");
//! assert_eq!(options.get_str("palette.secondary.main", "#9c27b0"), "#9c27b0");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Path of the palette mode inside a theme document.
pub const MODE_PATH: &str = "palette.mode";

/// Path of the background overrides inside a theme document.
pub const BACKGROUND_PATH: &str = "palette.background";

/// Light or dark palette mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteMode {
    #[default]
    Light,
    Dark,
}

impl PaletteMode {
    /// Parse a mode name. Only `"light"` and `"dark"` are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// The document representation of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The opposite mode.
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for PaletteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An arbitrarily shaped theme options document.
///
/// Cloning produces a structurally independent copy; no sub-object is ever
/// shared between two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeOptions(Value);

impl Default for ThemeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeOptions {
    /// An empty document (`{}`).
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap an existing JSON value. Non-object values are kept as-is; the
    /// style engine is responsible for rejecting them.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error if the text is not valid JSON.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    /// Borrow the underlying value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the document and return the underlying value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns true if the document root is a mapping.
    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// Look up the value at a dot-separated path.
    ///
    /// Returns `None` if any segment is missing or an intermediate value is
    /// not a mapping.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |current, segment| current.as_object()?.get(segment))
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        path.split('.').try_fold(&mut self.0, |current, segment| {
            current.as_object_mut()?.get_mut(segment)
        })
    }

    /// Read the string at `path`, or `fallback` if the path does not resolve
    /// to a string.
    pub fn get_str<'a>(&'a self, path: &str, fallback: &'a str) -> &'a str {
        self.get(path).and_then(Value::as_str).unwrap_or(fallback)
    }

    /// Set `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Intermediate values that are not mappings are replaced by empty
    /// mappings, as is a non-mapping root.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };

        let mut current = object_mut(&mut self.0);
        for segment in parents.into_iter().flat_map(|p| p.split('.')) {
            let child = current
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
            current = object_mut(child);
        }
        current.insert(last.to_string(), value.into());
    }

    /// Return a new document with `value` set at `path`, leaving `self`
    /// untouched.
    #[must_use]
    pub fn with_value(&self, path: &str, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.set(path, value);
        next
    }

    /// Remove and return the value at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (self.get_mut(parents)?, last),
            None => (&mut self.0, path),
        };
        parent.as_object_mut()?.remove(last)
    }

    /// The palette mode, if the document declares a supported one.
    pub fn mode(&self) -> Option<PaletteMode> {
        self.get(MODE_PATH)
            .and_then(Value::as_str)
            .and_then(PaletteMode::parse)
    }

    /// The mode an editor should display: dark only when explicitly dark.
    pub fn effective_mode(&self) -> PaletteMode {
        self.mode().unwrap_or_default()
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", self.0)
    }
}

impl From<Value> for ThemeOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<ThemeOptions> for Value {
    fn from(options: ThemeOptions) -> Self {
        options.0
    }
}

impl fmt::Display for ThemeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ThemeOptions {
        ThemeOptions::from(json!({
            "palette": {
                "mode": "dark",
                "primary": { "main": "#90caf9" },
                "background": { "default": "#121212" }
            },
            "shape": { "borderRadius": 8 }
        }))
    }

    #[test]
    fn test_get_str_resolves_nested_string() {
        let options = sample();
        assert_eq!(options.get_str("palette.primary.main", "#000"), "#90caf9");
    }

    #[test]
    fn test_get_str_falls_back_on_missing_segment() {
        let options = sample();
        assert_eq!(options.get_str("palette.secondary.main", "#9c27b0"), "#9c27b0");
        assert_eq!(options.get_str("typography.fontFamily", "Roboto"), "Roboto");
    }

    #[test]
    fn test_get_str_falls_back_on_non_string_leaf() {
        let options = sample();
        assert_eq!(options.get_str("shape.borderRadius", "4"), "4");
        assert_eq!(options.get_str("palette.primary", "#fff"), "#fff");
    }

    #[test]
    fn test_get_str_falls_back_when_intermediate_is_scalar() {
        let options = sample();
        assert_eq!(options.get_str("palette.mode.value", "light"), "light");
    }

    #[test]
    fn test_with_value_creates_intermediates() {
        let options = ThemeOptions::new().with_value("palette.error.main", "#d32f2f");
        assert_eq!(
            options.as_value(),
            &json!({ "palette": { "error": { "main": "#d32f2f" } } })
        );
    }

    #[test]
    fn test_with_value_leaves_source_untouched() {
        let original = sample();
        let before = original.clone();
        let next = original.with_value("palette.primary.main", "#ff0000");

        assert_eq!(original, before);
        assert_eq!(next.get_str("palette.primary.main", ""), "#ff0000");
        assert_eq!(next.get_str("palette.background.default", ""), "#121212");
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut options = ThemeOptions::from(json!({ "palette": "oops" }));
        options.set("palette.primary.main", "#123456");
        assert_eq!(options.get_str("palette.primary.main", ""), "#123456");
    }

    #[test]
    fn test_set_on_non_object_root() {
        let mut options = ThemeOptions::from(json!([1, 2, 3]));
        options.set("palette.mode", "light");
        assert_eq!(options.mode(), Some(PaletteMode::Light));
    }

    #[test]
    fn test_set_top_level_key() {
        let mut options = ThemeOptions::new();
        options.set("spacing", 8);
        assert_eq!(options.get("spacing"), Some(&json!(8)));
    }

    #[test]
    fn test_remove_nested() {
        let mut options = sample();
        let removed = options.remove(BACKGROUND_PATH);
        assert_eq!(removed, Some(json!({ "default": "#121212" })));
        assert!(options.get(BACKGROUND_PATH).is_none());
        assert!(options.remove("palette.missing.key").is_none());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(sample().mode(), Some(PaletteMode::Dark));
        let odd = ThemeOptions::new().with_value(MODE_PATH, "purple");
        assert_eq!(odd.mode(), None);
        assert_eq!(odd.effective_mode(), PaletteMode::Light);
        assert_eq!(PaletteMode::Dark.toggle(), PaletteMode::Light);
    }

    #[test]
    fn test_pretty_json_roundtrip() {
        let options = sample();
        let text = options.to_pretty_json();
        assert!(text.contains("\n  \"palette\""));
        assert_eq!(ThemeOptions::parse(&text).expect("parse"), options);
    }

    #[test]
    fn test_pretty_json_keeps_insertion_order() {
        let options = ThemeOptions::new()
            .with_value("zeta", 1)
            .with_value("alpha", 2);
        let text = options.to_pretty_json();
        let zeta = text.find("zeta").expect("zeta");
        let alpha = text.find("alpha").expect("alpha");
        assert!(zeta < alpha);
    }
}
