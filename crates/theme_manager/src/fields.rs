//! Structured color fields and selector entries.
//!
//! Each [`ColorField`] names a dot path inside a theme document and the
//! value an editor shows when the path is unset.

use crate::record::ThemeRecord;

/// Label shown when the active theme id does not resolve.
pub const UNKNOWN_THEME_NAME: &str = "Unknown theme";

/// An editable color inside a theme document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorField {
    pub group: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    pub fallback: &'static str,
}

impl ColorField {
    const fn new(
        group: &'static str,
        label: &'static str,
        path: &'static str,
        fallback: &'static str,
    ) -> Self {
        Self {
            group,
            label,
            path,
            fallback,
        }
    }

    /// Read this field from a record, or the fallback.
    pub fn read<'a>(&self, record: &'a ThemeRecord) -> &'a str {
        record.option_str(self.path, self.fallback)
    }

    /// Group `fields` by [`ColorField::group`], keeping first-seen order.
    pub fn groups(fields: &[Self]) -> Vec<(&'static str, Vec<Self>)> {
        let mut groups: Vec<(&'static str, Vec<Self>)> = Vec::new();
        for field in fields {
            match groups.iter_mut().find(|(name, _)| *name == field.group) {
                Some((_, members)) => members.push(*field),
                None => groups.push((field.group, vec![*field])),
            }
        }
        groups
    }
}

/// Primary and secondary main colors.
pub const BASIC_COLOR_FIELDS: [ColorField; 2] = [
    ColorField::new("Palette", "Primary", "palette.primary.main", "#1976d2"),
    ColorField::new("Palette", "Secondary", "palette.secondary.main", "#9c27b0"),
];

/// Contrast, surface, text, and status colors.
pub const ADVANCED_COLOR_FIELDS: [ColorField; 10] = [
    ColorField::new(
        "Contrast",
        "Primary contrast text",
        "palette.primary.contrastText",
        "#ffffff",
    ),
    ColorField::new(
        "Contrast",
        "Secondary contrast text",
        "palette.secondary.contrastText",
        "#ffffff",
    ),
    ColorField::new("Background", "Default", "palette.background.default", "#121212"),
    ColorField::new("Background", "Paper", "palette.background.paper", "#1e1e1e"),
    ColorField::new("Text", "Primary", "palette.text.primary", "#ffffff"),
    ColorField::new("Text", "Secondary", "palette.text.secondary", "#bdbdbd"),
    ColorField::new("Status", "Error", "palette.error.main", "#d32f2f"),
    ColorField::new("Status", "Warning", "palette.warning.main", "#ed6c02"),
    ColorField::new("Status", "Info", "palette.info.main", "#0288d1"),
    ColorField::new("Status", "Success", "palette.success.main", "#2e7d32"),
];

/// One row of a theme selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEntry {
    pub id: String,
    pub name: String,
    pub is_preset: bool,
    pub is_active: bool,
    /// Custom themes can be edited and deleted in place.
    pub editable: bool,
}

/// Build selector rows for `themes`, marking `active_id`.
pub fn selector_entries(themes: &[ThemeRecord], active_id: &str) -> Vec<SelectorEntry> {
    themes
        .iter()
        .map(|theme| SelectorEntry {
            id: theme.id.clone(),
            name: theme.name.clone(),
            is_preset: theme.is_preset,
            is_active: theme.id == active_id,
            editable: !theme.is_preset,
        })
        .collect()
}

/// The label a selector shows for the active theme.
pub fn active_theme_name<'a>(themes: &'a [ThemeRecord], active_id: &str) -> &'a str {
    themes
        .iter()
        .find(|t| t.id == active_id)
        .map_or(UNKNOWN_THEME_NAME, |t| t.name.as_str())
}
