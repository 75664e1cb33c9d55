//! Theme records and partial updates.

use crate::document::{PaletteMode, ThemeOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, identified bundle of visual configuration tokens.
///
/// Records serialize with camelCase keys (`themeOptions`, `isPreset`) so that
/// stored data stays compatible with other hosts of the same storage keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRecord {
    /// Unique id within a registry; the only lookup and merge key.
    pub id: String,

    /// Display label. Empty only inside an uncommitted draft.
    #[serde(default)]
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The style-token document.
    #[serde(default)]
    pub theme_options: ThemeOptions,

    /// True for registry-supplied, read-only themes.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_preset: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ThemeRecord {
    /// Create a custom (non-preset) record.
    pub fn new(id: impl Into<String>, name: impl Into<String>, theme_options: ThemeOptions) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            theme_options,
            is_preset: false,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark this record as a read-only preset.
    pub fn as_preset(mut self) -> Self {
        self.is_preset = true;
        self
    }

    /// Replace the options document.
    pub fn with_options(mut self, theme_options: ThemeOptions) -> Self {
        self.theme_options = theme_options;
        self
    }

    /// Return a copy with `value` written at `path` inside the options
    /// document. `self` is left untouched.
    #[must_use]
    pub fn with_option(&self, path: &str, value: impl Into<Value>) -> Self {
        Self {
            theme_options: self.theme_options.with_value(path, value),
            ..self.clone()
        }
    }

    /// Read the string at `path` inside the options document, or `fallback`.
    pub fn option_str<'a>(&'a self, path: &str, fallback: &'a str) -> &'a str {
        self.theme_options.get_str(path, fallback)
    }

    /// The mode an editor should display for this record.
    pub fn mode(&self) -> PaletteMode {
        self.theme_options.effective_mode()
    }

    /// Merge a partial update into this record.
    pub fn apply(&mut self, patch: ThemePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(theme_options) = patch.theme_options {
            self.theme_options = theme_options;
        }
    }

    /// Return a merged copy of this record.
    #[must_use]
    pub fn merged(&self, patch: ThemePatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// A partial update for a custom theme.
///
/// The id and preset flag are not patchable; ids are immutable once a record
/// is registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemePatch {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub theme_options: Option<ThemeOptions>,
}

impl ThemePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn theme_options(mut self, theme_options: ThemeOptions) -> Self {
        self.theme_options = Some(theme_options);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.theme_options.is_none()
    }
}

impl From<ThemeRecord> for ThemePatch {
    /// A patch that overwrites every patchable field with the record's values.
    fn from(record: ThemeRecord) -> Self {
        Self {
            name: Some(record.name),
            description: Some(record.description),
            theme_options: Some(record.theme_options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn custom() -> ThemeRecord {
        ThemeRecord::new(
            "custom-1",
            "Mine",
            ThemeOptions::from(json!({ "palette": { "mode": "light" } })),
        )
    }

    #[test]
    fn test_record_json_shape() {
        let record = custom().with_description("test");
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "custom-1",
                "name": "Mine",
                "description": "test",
                "themeOptions": { "palette": { "mode": "light" } }
            })
        );
    }

    #[test]
    fn test_record_deserialize_defaults() {
        let record: ThemeRecord =
            serde_json::from_str(r#"{"id":"x","isPreset":true}"#).expect("deserialize");
        assert_eq!(record.id, "x");
        assert!(record.name.is_empty());
        assert!(record.is_preset);
        assert_eq!(record.theme_options, ThemeOptions::new());
    }

    #[test]
    fn test_with_option_is_isolated() {
        let original = custom();
        let next = original.with_option("palette.primary.main", "#ff0000");
        assert_eq!(original.option_str("palette.primary.main", "none"), "none");
        assert_eq!(next.option_str("palette.primary.main", "none"), "#ff0000");
        assert_eq!(next.id, original.id);
    }

    #[test]
    fn test_patch_merge_keeps_unset_fields() {
        let record = custom().with_description("keep me");
        let merged = record.merged(ThemePatch::new().name("Renamed"));
        assert_eq!(merged.name, "Renamed");
        assert_eq!(merged.description.as_deref(), Some("keep me"));
        assert_eq!(merged.theme_options, record.theme_options);
    }

    #[test]
    fn test_patch_can_clear_description() {
        let record = custom().with_description("drop me");
        let merged = record.merged(ThemePatch::new().description(None));
        assert!(merged.description.is_none());
    }

    #[test]
    fn test_full_patch_from_record() {
        let source = custom()
            .with_option("palette.mode", "dark")
            .with_description("d");
        let patch = ThemePatch::from(source.clone());
        assert!(!patch.is_empty());
        let target = ThemeRecord::new("custom-1", "Old", ThemeOptions::new());
        assert_eq!(target.merged(patch), source);
    }
}
