//! Built-in preset themes.
//!
//! | Preset | Mode  | Primary   | Secondary |
//! |--------|-------|-----------|-----------|
//! | Light  | light | `#1976d2` | `#9c27b0` |
//! | Dark   | dark  | `#90caf9` | `#f48fb1` |
//! | Ocean  | light | `#006064` | `#00838f` |

use crate::document::ThemeOptions;
use crate::record::ThemeRecord;
use serde_json::json;
use std::fmt;

/// Id used when no preset is available to resolve against.
pub const FALLBACK_THEME_ID: &str = "default";

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinPreset {
    Light,
    Dark,
    Ocean,
}

impl BuiltinPreset {
    /// All presets, in registration order.
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::Ocean];

    /// The registry id of this preset.
    pub fn id(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Ocean => "ocean",
        }
    }

    /// Build the preset record.
    pub fn to_record(self) -> ThemeRecord {
        let (description, options) = match self {
            Self::Light => (
                "Default light theme",
                json!({
                    "palette": {
                        "mode": "light",
                        "primary": { "main": "#1976d2" },
                        "secondary": { "main": "#9c27b0" }
                    }
                }),
            ),
            Self::Dark => (
                "Default dark theme",
                json!({
                    "palette": {
                        "mode": "dark",
                        "primary": { "main": "#90caf9" },
                        "secondary": { "main": "#f48fb1" },
                        "background": { "default": "#121212", "paper": "#1e1e1e" }
                    }
                }),
            ),
            Self::Ocean => (
                "Blue and teal accent theme",
                json!({
                    "palette": {
                        "mode": "light",
                        "primary": { "main": "#006064" },
                        "secondary": { "main": "#00838f" }
                    }
                }),
            ),
        };

        ThemeRecord::new(self.id(), self.to_string(), ThemeOptions::from(options))
            .with_description(description)
            .as_preset()
    }
}

impl fmt::Display for BuiltinPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("Light"),
            Self::Dark => f.write_str("Dark"),
            Self::Ocean => f.write_str("Ocean"),
        }
    }
}

/// The default preset set used when a registry is built without presets.
pub fn default_presets() -> Vec<ThemeRecord> {
    BuiltinPreset::ALL.iter().map(|p| p.to_record()).collect()
}

/// The record rendered when nothing else resolves.
pub fn fallback_record() -> ThemeRecord {
    ThemeRecord::new(FALLBACK_THEME_ID, "Default", ThemeOptions::new())
}
