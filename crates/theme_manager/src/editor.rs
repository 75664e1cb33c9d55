//! Draft editing of theme records.
//!
//! A [`DraftSession`] holds a structurally independent copy of a theme while
//! it is being edited. Field edits and raw document edits only touch the
//! draft; the registry sees the draft through its preview overlay while live
//! editing is on, and receives it for real only on [`DraftSession::commit`].
//!
//! Sessions opened on a preset are read-only: every mutating entry point
//! returns [`EditorError::ReadOnly`] and leaves the session unchanged.

use crate::document::{BACKGROUND_PATH, MODE_PATH, PaletteMode, ThemeOptions};
use crate::engine::{PaletteEngine, StyleEngine};
use crate::fields::ColorField;
use crate::record::{ThemePatch, ThemeRecord};
use crate::registry::ThemeRegistry;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Error from a draft editing operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("no theme editor is open")]
    NotOpen,
    #[error("theme `{0}` is read-only")]
    ReadOnly(String),
    #[error("theme name must not be empty")]
    EmptyName,
    #[error("invalid theme document: {0}")]
    InvalidDocument(String),
}

/// Whether a session creates a new theme or edits an existing custom one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftMode {
    Creating,
    Editing { id: String },
}

/// Read-only view of a session for presentation code.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub mode: DraftMode,
    pub draft: ThemeRecord,
    pub raw_text: String,
    pub raw_error: Option<String>,
    pub live_editing: bool,
    pub read_only: bool,
    pub origin: Option<String>,
    pub has_changes: bool,
}

/// An open theme editor.
#[derive(Debug)]
pub struct DraftSession<E: StyleEngine = PaletteEngine> {
    registry: ThemeRegistry<E>,
    mode: DraftMode,
    draft: ThemeRecord,
    original: ThemeRecord,
    raw_text: String,
    raw_error: Option<String>,
    live_editing: bool,
    read_only: bool,
    origin: Option<String>,
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// A timestamped id not yet known to `registry`.
fn fresh_id<E: StyleEngine>(registry: &ThemeRegistry<E>, base_name: Option<&str>) -> String {
    let prefix = base_name
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "custom".to_string());
    let stem = format!("{prefix}-{}", Utc::now().timestamp_millis());

    let mut id = stem.clone();
    let mut suffix = 2u32;
    while registry.contains(&id) {
        id = format!("{stem}-{suffix}");
        suffix += 1;
    }
    id
}

impl<E: StyleEngine> DraftSession<E> {
    /// Open a session creating a new theme.
    ///
    /// The draft copies `base`'s options and description (or the active
    /// record's when no base is given) under a fresh id with an empty name.
    pub fn create(registry: &ThemeRegistry<E>, base: Option<&ThemeRecord>, live_editing: bool) -> Self {
        let id = fresh_id(registry, base.map(|b| b.name.as_str()));
        let base = base.cloned().unwrap_or_else(|| registry.active_record());
        let mut draft = ThemeRecord::new(id, "", base.theme_options);
        draft.description = base.description;
        debug!(theme.id = %draft.id, "Editor opened for a new theme");
        Self::open(registry, DraftMode::Creating, draft, false, live_editing)
    }

    /// Open a session on an existing record.
    ///
    /// Presets open read-only. Records that are not registered custom themes
    /// open as a creation under their own id.
    pub fn edit(registry: &ThemeRegistry<E>, record: &ThemeRecord, live_editing: bool) -> Self {
        let read_only = record.is_preset || registry.is_preset(&record.id);
        let mode = if !read_only && registry.is_custom(&record.id) {
            DraftMode::Editing {
                id: record.id.clone(),
            }
        } else {
            DraftMode::Creating
        };
        debug!(theme.id = %record.id, theme.read_only = read_only, "Editor opened");
        Self::open(registry, mode, record.clone(), read_only, live_editing)
    }

    fn open(
        registry: &ThemeRegistry<E>,
        mode: DraftMode,
        draft: ThemeRecord,
        read_only: bool,
        live_editing: bool,
    ) -> Self {
        let session = Self {
            registry: registry.clone(),
            mode,
            raw_text: draft.theme_options.to_pretty_json(),
            original: draft.clone(),
            draft,
            raw_error: None,
            live_editing: live_editing && !read_only,
            read_only,
            origin: None,
        };
        session.push_preview();
        session
    }

    /// Record which selector requested the editor.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    fn ensure_writable(&self) -> Result<(), EditorError> {
        if self.read_only {
            debug!(theme.id = %self.draft.id, "Rejected edit of read-only theme");
            return Err(EditorError::ReadOnly(self.draft.id.clone()));
        }
        Ok(())
    }

    fn push_preview(&self) {
        if self.live_editing {
            self.registry.set_preview_theme(Some(self.draft.clone()));
        }
    }

    /// Replace the draft after a structured edit.
    fn replace_draft(&mut self, draft: ThemeRecord) -> Result<(), EditorError> {
        self.ensure_writable()?;
        self.draft = draft;
        self.raw_text = self.draft.theme_options.to_pretty_json();
        self.raw_error = None;
        self.push_preview();
        Ok(())
    }

    /// Set the draft name.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), EditorError> {
        let mut draft = self.draft.clone();
        draft.name = name.into();
        self.replace_draft(draft)
    }

    /// Set or clear the draft description. Blank text clears it.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions.
    pub fn set_description(&mut self, description: Option<String>) -> Result<(), EditorError> {
        let mut draft = self.draft.clone();
        draft.description = description.filter(|d| !d.trim().is_empty());
        self.replace_draft(draft)
    }

    /// Switch the palette mode, dropping background overrides so the new
    /// mode's default surfaces apply.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions.
    pub fn set_mode(&mut self, mode: PaletteMode) -> Result<(), EditorError> {
        let mut draft = self.draft.with_option(MODE_PATH, mode.as_str());
        draft.theme_options.remove(BACKGROUND_PATH);
        self.replace_draft(draft)
    }

    /// Write `value` at a dot path inside the draft's options.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions.
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<(), EditorError> {
        let draft = self.draft.with_option(path, value);
        self.replace_draft(draft)
    }

    /// Replace the raw document text.
    ///
    /// The text is kept as typed. If it parses and the style engine accepts
    /// it, it becomes the draft's options; otherwise the error is recorded
    /// and the draft is left alone.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions and
    /// `EditorError::InvalidDocument` for rejected text.
    pub fn update_raw(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_writable()?;
        self.raw_text = text.into();

        let parsed = ThemeOptions::parse(&self.raw_text)
            .map_err(|err| err.to_string())
            .and_then(|options| {
                self.registry
                    .engine()
                    .build(&options)
                    .map(|_| options)
                    .map_err(|err| err.to_string())
            });
        match parsed {
            Ok(options) => {
                self.draft.theme_options = options;
                self.raw_error = None;
                self.push_preview();
                Ok(())
            }
            Err(message) => {
                debug!(theme.id = %self.draft.id, error = %message, "Raw theme document rejected");
                self.raw_error = Some(message.clone());
                Err(EditorError::InvalidDocument(message))
            }
        }
    }

    /// Toggle live editing. Turning it on previews the draft; turning it off
    /// clears the preview.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions.
    pub fn set_live_editing(&mut self, enabled: bool) -> Result<(), EditorError> {
        self.ensure_writable()?;
        self.live_editing = enabled;
        if enabled {
            self.push_preview();
        } else {
            self.registry.set_preview_theme(None);
        }
        Ok(())
    }

    /// Commit the draft to the registry and clear the preview.
    ///
    /// Drafts of a registered custom theme update it in place; anything else
    /// is created as a new custom theme.
    ///
    /// # Errors
    /// Returns `EditorError::ReadOnly` for preset sessions and
    /// `EditorError::EmptyName` when the name is blank.
    pub fn commit(&self) -> Result<ThemeRecord, EditorError> {
        self.ensure_writable()?;
        if self.draft.name.trim().is_empty() {
            return Err(EditorError::EmptyName);
        }

        let updated = match &self.mode {
            DraftMode::Editing { id } => self
                .registry
                .update_custom_theme(id, ThemePatch::from(self.draft.clone())),
            DraftMode::Creating => None,
        };
        let saved = match updated {
            Some(saved) => saved,
            None => {
                let record = ThemeRecord {
                    is_preset: false,
                    ..self.draft.clone()
                };
                if !self.registry.create_custom_theme(record.clone()) {
                    return Err(EditorError::ReadOnly(record.id));
                }
                record
            }
        };

        self.registry.set_preview_theme(None);
        info!(theme.id = %saved.id, theme.name = %saved.name, "Draft committed");
        Ok(saved)
    }

    /// Abandon the draft and clear the preview. Nothing is persisted.
    pub fn discard(&self) {
        debug!(theme.id = %self.draft.id, "Draft discarded");
        self.registry.set_preview_theme(None);
    }

    pub fn mode(&self) -> &DraftMode {
        &self.mode
    }

    /// The id of the custom theme being edited, if any.
    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            DraftMode::Editing { id } => Some(id),
            DraftMode::Creating => None,
        }
    }

    pub fn draft(&self) -> &ThemeRecord {
        &self.draft
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn raw_error(&self) -> Option<&str> {
        self.raw_error.as_deref()
    }

    pub fn is_live_editing(&self) -> bool {
        self.live_editing
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// The draft's value for a color field, or the field's fallback.
    pub fn color(&self, field: &ColorField) -> &str {
        field.read(&self.draft)
    }

    pub fn has_changes(&self) -> bool {
        self.draft != self.original
    }

    pub fn can_save(&self) -> bool {
        !self.read_only && !self.draft.name.trim().is_empty()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            mode: self.mode.clone(),
            draft: self.draft.clone(),
            raw_text: self.raw_text.clone(),
            raw_error: self.raw_error.clone(),
            live_editing: self.live_editing,
            read_only: self.read_only,
            origin: self.origin.clone(),
            has_changes: self.has_changes(),
        }
    }
}
