//! Style-engine boundary.
//!
//! The registry never renders a theme document itself. It sanitizes the
//! resolved document with [`sanitize_options`] and hands it to a
//! [`StyleEngine`], which validates the structure and produces an opaque,
//! renderable theme object. The draft editor uses the same engine to reject
//! raw documents that would fail construction.
//!
//! [`PaletteEngine`] is the built-in engine. It fills mode-dependent
//! defaults for every palette intent and computes contrast text colors.

use crate::color::{Rgba, contrast_ratio, parse_css_color};
use crate::document::{MODE_PATH, PaletteMode, ThemeOptions};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Builds renderable themes from option documents.
pub trait StyleEngine: Send + Sync {
    /// The renderable theme object.
    type Theme: Clone + fmt::Debug + Send + Sync + 'static;

    /// Construct a theme, validating the document.
    ///
    /// # Errors
    /// Returns `EngineError` if the document is structurally unacceptable.
    fn build(&self, options: &ThemeOptions) -> Result<Self::Theme, EngineError>;

    /// A theme that is always constructible, used when a resolved document
    /// is rejected.
    fn fallback(&self) -> Self::Theme;
}

/// Error constructing a theme.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("theme options must be an object")]
    NotAnObject,
    #[error("palette must be an object")]
    InvalidPalette,
    #[error("palette mode `{0}` is not supported")]
    UnsupportedMode(String),
    #[error("palette.{0} must be an object")]
    InvalidIntent(&'static str),
    #[error("palette.{0} needs a `main` color")]
    MissingMain(&'static str),
    #[error("unsupported color `{value}` at {path}")]
    InvalidColor { path: String, value: String },
    #[error("{0} must be a number")]
    InvalidNumber(&'static str),
    #[error("{0} must be a string")]
    InvalidString(&'static str),
}

/// Coerce a document into a shape that is safe to hand to a style engine.
///
/// The root and `palette` become mappings, and `palette.mode` is forced to
/// `"light"` unless it is already `"light"` or `"dark"`. Everything else
/// passes through unchanged.
pub fn sanitize_options(options: &ThemeOptions) -> ThemeOptions {
    let mut clean = if options.is_object() {
        options.clone()
    } else {
        ThemeOptions::new()
    };
    if !clean.get("palette").is_some_and(Value::is_object) {
        clean.set("palette", Value::Object(Map::new()));
    }
    if clean.mode().is_none() {
        clean.set(MODE_PATH, PaletteMode::Light.as_str());
    }
    clean
}

/// Semantic palette intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Primary,
    Secondary,
    Error,
    Warning,
    Info,
    Success,
}

impl Intent {
    pub const ALL: [Self; 6] = [
        Self::Primary,
        Self::Secondary,
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Success,
    ];

    /// The palette key for this intent.
    pub fn key(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }

    fn default_main(self, mode: PaletteMode) -> &'static str {
        match (mode, self) {
            (PaletteMode::Light, Self::Primary) => "#1976d2",
            (PaletteMode::Light, Self::Secondary) => "#9c27b0",
            (PaletteMode::Light, Self::Error) => "#d32f2f",
            (PaletteMode::Light, Self::Warning) => "#ed6c02",
            (PaletteMode::Light, Self::Info) => "#0288d1",
            (PaletteMode::Light, Self::Success) => "#2e7d32",
            (PaletteMode::Dark, Self::Primary) => "#90caf9",
            (PaletteMode::Dark, Self::Secondary) => "#ce93d8",
            (PaletteMode::Dark, Self::Error) => "#f44336",
            (PaletteMode::Dark, Self::Warning) => "#ffa726",
            (PaletteMode::Dark, Self::Info) => "#29b6f6",
            (PaletteMode::Dark, Self::Success) => "#66bb6a",
        }
    }
}

/// A resolved intent color.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColor {
    pub main: String,
    pub contrast_text: String,
}

/// Background surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundColors {
    pub default: String,
    pub paper: String,
}

/// Text colors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextColors {
    pub primary: String,
    pub secondary: String,
    pub disabled: String,
}

/// Typography settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    pub font_size: f64,
}

/// A fully resolved, renderable theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTheme {
    pub mode: PaletteMode,
    pub primary: PaletteColor,
    pub secondary: PaletteColor,
    pub error: PaletteColor,
    pub warning: PaletteColor,
    pub info: PaletteColor,
    pub success: PaletteColor,
    pub background: BackgroundColors,
    pub text: TextColors,
    pub divider: String,
    pub typography: Typography,
    pub border_radius: f64,
    /// The sanitized source document, for component-level overrides.
    pub options: ThemeOptions,
}

const DARK_TEXT: &str = "rgba(0, 0, 0, 0.87)";
const LIGHT_TEXT: &str = "#fff";
const CONTRAST_THRESHOLD: f64 = 3.0;
const DEFAULT_FONT_FAMILY: &str = r#""Roboto", "Helvetica", "Arial", sans-serif"#;

fn contrast_text(main: Rgba) -> String {
    if contrast_ratio(main, Rgba::WHITE) >= CONTRAST_THRESHOLD {
        LIGHT_TEXT.to_string()
    } else {
        DARK_TEXT.to_string()
    }
}

impl RenderTheme {
    /// The default theme for a mode.
    pub fn defaults(mode: PaletteMode) -> Self {
        let intent = |intent: Intent| {
            let main = intent.default_main(mode);
            PaletteColor {
                main: main.to_string(),
                contrast_text: parse_css_color(main)
                    .map_or_else(|| LIGHT_TEXT.to_string(), contrast_text),
            }
        };
        let (background, text, divider) = match mode {
            PaletteMode::Light => (
                BackgroundColors {
                    default: "#fff".into(),
                    paper: "#fff".into(),
                },
                TextColors {
                    primary: DARK_TEXT.into(),
                    secondary: "rgba(0, 0, 0, 0.6)".into(),
                    disabled: "rgba(0, 0, 0, 0.38)".into(),
                },
                "rgba(0, 0, 0, 0.12)",
            ),
            PaletteMode::Dark => (
                BackgroundColors {
                    default: "#121212".into(),
                    paper: "#121212".into(),
                },
                TextColors {
                    primary: "#fff".into(),
                    secondary: "rgba(255, 255, 255, 0.7)".into(),
                    disabled: "rgba(255, 255, 255, 0.5)".into(),
                },
                "rgba(255, 255, 255, 0.12)",
            ),
        };

        Self {
            mode,
            primary: intent(Intent::Primary),
            secondary: intent(Intent::Secondary),
            error: intent(Intent::Error),
            warning: intent(Intent::Warning),
            info: intent(Intent::Info),
            success: intent(Intent::Success),
            background,
            text,
            divider: divider.to_string(),
            typography: Typography {
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                font_size: 14.0,
            },
            border_radius: 4.0,
            options: ThemeOptions::new(),
        }
    }

    /// Borrow the color for an intent.
    pub fn intent(&self, intent: Intent) -> &PaletteColor {
        match intent {
            Intent::Primary => &self.primary,
            Intent::Secondary => &self.secondary,
            Intent::Error => &self.error,
            Intent::Warning => &self.warning,
            Intent::Info => &self.info,
            Intent::Success => &self.success,
        }
    }

    fn intent_mut(&mut self, intent: Intent) -> &mut PaletteColor {
        match intent {
            Intent::Primary => &mut self.primary,
            Intent::Secondary => &mut self.secondary,
            Intent::Error => &mut self.error,
            Intent::Warning => &mut self.warning,
            Intent::Info => &mut self.info,
            Intent::Success => &mut self.success,
        }
    }
}

/// The built-in palette engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteEngine;

impl PaletteEngine {
    pub fn new() -> Self {
        Self
    }
}

fn color_at(map: &Map<String, Value>, key: &str, path: String) -> Result<Option<String>, EngineError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if parse_css_color(s).is_some() => Ok(Some(s.clone())),
        Some(other) => Err(EngineError::InvalidColor {
            path,
            value: other.as_str().map_or_else(|| other.to_string(), str::to_string),
        }),
    }
}

fn number_at(root: &Map<String, Value>, section: &str, key: &str, path: &'static str) -> Result<Option<f64>, EngineError> {
    let Some(Value::Object(section)) = root.get(section) else {
        return Ok(None);
    };
    match section.get(key) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or(EngineError::InvalidNumber(path)),
    }
}

fn copy_strings<'a>(source: Option<&Value>, targets: impl IntoIterator<Item = (&'a str, &'a mut String)>) {
    let Some(Value::Object(map)) = source else {
        return;
    };
    for (key, target) in targets {
        if let Some(Value::String(s)) = map.get(key) {
            target.clone_from(s);
        }
    }
}

impl StyleEngine for PaletteEngine {
    type Theme = RenderTheme;

    fn build(&self, options: &ThemeOptions) -> Result<RenderTheme, EngineError> {
        let root = options.as_value().as_object().ok_or(EngineError::NotAnObject)?;
        let empty = Map::new();
        let palette = match root.get("palette") {
            None => &empty,
            Some(Value::Object(palette)) => palette,
            Some(_) => return Err(EngineError::InvalidPalette),
        };

        let mode = match palette.get("mode") {
            None => PaletteMode::Light,
            Some(Value::String(s)) => {
                PaletteMode::parse(s).ok_or_else(|| EngineError::UnsupportedMode(s.clone()))?
            }
            Some(other) => return Err(EngineError::UnsupportedMode(other.to_string())),
        };

        let mut theme = RenderTheme::defaults(mode);

        for intent in Intent::ALL {
            let key = intent.key();
            let entry = match palette.get(key) {
                None => continue,
                Some(Value::Object(entry)) => entry,
                Some(_) => return Err(EngineError::InvalidIntent(key)),
            };
            let main = color_at(entry, "main", format!("palette.{key}.main"))?
                .ok_or(EngineError::MissingMain(key))?;
            let contrast = match color_at(entry, "contrastText", format!("palette.{key}.contrastText"))? {
                Some(contrast) => contrast,
                None => parse_css_color(&main).map_or_else(|| LIGHT_TEXT.to_string(), contrast_text),
            };
            *theme.intent_mut(intent) = PaletteColor {
                main,
                contrast_text: contrast,
            };
        }

        copy_strings(
            palette.get("background"),
            [
                ("default", &mut theme.background.default),
                ("paper", &mut theme.background.paper),
            ],
        );
        copy_strings(
            palette.get("text"),
            [
                ("primary", &mut theme.text.primary),
                ("secondary", &mut theme.text.secondary),
                ("disabled", &mut theme.text.disabled),
            ],
        );
        if let Some(Value::String(divider)) = palette.get("divider") {
            theme.divider.clone_from(divider);
        }

        if let Some(Value::Object(typography)) = root.get("typography") {
            match typography.get("fontFamily") {
                None => {}
                Some(Value::String(family)) => theme.typography.font_family.clone_from(family),
                Some(_) => return Err(EngineError::InvalidString("typography.fontFamily")),
            }
        }
        if let Some(size) = number_at(root, "typography", "fontSize", "typography.fontSize")? {
            theme.typography.font_size = size;
        }
        if let Some(radius) = number_at(root, "shape", "borderRadius", "shape.borderRadius")? {
            theme.border_radius = radius;
        }

        theme.options = options.clone();
        Ok(theme)
    }

    fn fallback(&self) -> RenderTheme {
        let mut theme = RenderTheme::defaults(PaletteMode::Light);
        theme.options = sanitize_options(&ThemeOptions::new());
        theme
    }
}
