//! The context object handed to presentation code.
//!
//! [`ThemeManager`] owns a registry handle and at most one open editor
//! session. Presentation code reads [`ThemeManager::state`] and issues the
//! command methods; it never touches registry internals.
//!
//! # Example
//!
//! ```rust
//! use theme_manager::manager::ThemeManager;
//! use theme_manager::registry::ThemeRegistry;
//!
//! let mut manager = ThemeManager::new(ThemeRegistry::builder().build());
//! manager.open_editor(None);
//! manager.set_draft_name("Sunrise").unwrap();
//! manager.update_draft_field("palette.primary.main", "#ff7043").unwrap();
//! let saved = manager.save().unwrap();
//!
//! assert!(manager.state().editor.is_none());
//! assert!(manager.registry().is_custom(&saved.id));
//! ```

use crate::document::PaletteMode;
use crate::editor::{DraftSession, EditorError, EditorSnapshot};
use crate::engine::{PaletteEngine, StyleEngine};
use crate::fields::{SelectorEntry, active_theme_name, selector_entries};
use crate::record::{ThemePatch, ThemeRecord};
use crate::registry::ThemeRegistry;
use serde_json::Value;
use tracing::debug;

/// Everything presentation code renders from.
#[derive(Debug, Clone)]
pub struct ManagerState<T> {
    pub presets: Vec<ThemeRecord>,
    pub custom_themes: Vec<ThemeRecord>,
    pub active_theme_id: String,
    pub resolved_record: ThemeRecord,
    pub resolved_theme: T,
    pub editor: Option<EditorSnapshot>,
}

/// Registry handle plus the open editor, if any.
#[derive(Debug)]
pub struct ThemeManager<E: StyleEngine = PaletteEngine> {
    registry: ThemeRegistry<E>,
    editor: Option<DraftSession<E>>,
    live_editing: bool,
}

impl<E: StyleEngine> ThemeManager<E> {
    pub fn new(registry: ThemeRegistry<E>) -> Self {
        Self {
            registry,
            editor: None,
            live_editing: false,
        }
    }

    /// Whether new editor sessions start with live editing on.
    #[must_use]
    pub fn with_live_editing(mut self, enabled: bool) -> Self {
        self.live_editing = enabled;
        self
    }

    pub fn registry(&self) -> &ThemeRegistry<E> {
        &self.registry
    }

    pub fn editor(&self) -> Option<&DraftSession<E>> {
        self.editor.as_ref()
    }

    pub fn state(&self) -> ManagerState<E::Theme> {
        let snapshot = self.registry.snapshot();
        ManagerState {
            presets: snapshot.presets,
            custom_themes: snapshot.custom_themes,
            active_theme_id: snapshot.active_theme_id,
            resolved_record: snapshot.resolved_record,
            resolved_theme: snapshot.resolved_theme,
            editor: self.editor.as_ref().map(DraftSession::snapshot),
        }
    }

    pub fn set_active_theme(&self, id: &str) -> bool {
        self.registry.set_active_theme(id)
    }

    /// Activate a theme from a selector and drop any preview.
    pub fn select_theme(&self, id: &str) -> bool {
        let changed = self.registry.set_active_theme(id);
        self.registry.set_preview_theme(None);
        changed
    }

    pub fn create_custom_theme(&self, record: ThemeRecord) -> bool {
        self.registry.create_custom_theme(record)
    }

    pub fn update_custom_theme(&self, id: &str, patch: ThemePatch) -> Option<ThemeRecord> {
        self.registry.update_custom_theme(id, patch)
    }

    pub fn delete_custom_theme(&self, id: &str) -> bool {
        self.registry.delete_custom_theme(id)
    }

    pub fn set_preview_theme(&self, preview: Option<ThemeRecord>) {
        self.registry.set_preview_theme(preview);
    }

    fn replace_editor(
        &mut self,
        open: impl FnOnce(&ThemeRegistry<E>, bool) -> DraftSession<E>,
    ) -> &DraftSession<E> {
        if let Some(previous) = self.editor.take() {
            previous.discard();
        }
        let session = open(&self.registry, self.live_editing);
        self.editor.insert(session)
    }

    fn seeded(registry: &ThemeRegistry<E>, seed: Option<&ThemeRecord>, live: bool) -> DraftSession<E> {
        match seed {
            Some(record) => DraftSession::edit(registry, record, live),
            None => DraftSession::create(registry, None, live),
        }
    }

    /// Open the editor on `seed`, or on a new theme based on the active one.
    /// Any open session is discarded first.
    pub fn open_editor(&mut self, seed: Option<&ThemeRecord>) -> &DraftSession<E> {
        self.replace_editor(|registry, live| Self::seeded(registry, seed, live))
    }

    /// Like [`Self::open_editor`], remembering which selector asked.
    pub fn open_editor_from(
        &mut self,
        origin: impl Into<String>,
        seed: Option<&ThemeRecord>,
    ) -> &DraftSession<E> {
        let origin = origin.into();
        self.replace_editor(|registry, live| Self::seeded(registry, seed, live).with_origin(origin))
    }

    /// Open the editor on a new theme copying `base`'s options.
    pub fn open_new_theme(&mut self, base: Option<&ThemeRecord>) -> &DraftSession<E> {
        self.replace_editor(|registry, live| DraftSession::create(registry, base, live))
    }

    /// Close the editor without saving. Returns false if none was open.
    pub fn close_editor(&mut self) -> bool {
        match self.editor.take() {
            Some(session) => {
                session.discard();
                true
            }
            None => {
                debug!("No theme editor to close");
                false
            }
        }
    }

    /// Alias for [`Self::close_editor`].
    pub fn cancel(&mut self) -> bool {
        self.close_editor()
    }

    fn session_mut(&mut self) -> Result<&mut DraftSession<E>, EditorError> {
        self.editor.as_mut().ok_or(EditorError::NotOpen)
    }

    /// # Errors
    /// Returns `EditorError` if no editor is open or the session rejects the edit.
    pub fn update_draft_field(&mut self, path: &str, value: impl Into<Value>) -> Result<(), EditorError> {
        self.session_mut()?.set_field(path, value)
    }

    /// # Errors
    /// Returns `EditorError` if no editor is open or the session rejects the edit.
    pub fn set_draft_name(&mut self, name: impl Into<String>) -> Result<(), EditorError> {
        self.session_mut()?.set_name(name)
    }

    /// # Errors
    /// Returns `EditorError` if no editor is open or the session rejects the edit.
    pub fn set_draft_description(&mut self, description: Option<String>) -> Result<(), EditorError> {
        self.session_mut()?.set_description(description)
    }

    /// # Errors
    /// Returns `EditorError` if no editor is open or the session rejects the edit.
    pub fn set_draft_mode(&mut self, mode: PaletteMode) -> Result<(), EditorError> {
        self.session_mut()?.set_mode(mode)
    }

    /// # Errors
    /// Returns `EditorError` if no editor is open or the text is rejected.
    pub fn update_draft_raw(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        self.session_mut()?.update_raw(text)
    }

    /// # Errors
    /// Returns `EditorError` if no editor is open or the session is read-only.
    pub fn set_live_editing(&mut self, enabled: bool) -> Result<(), EditorError> {
        self.session_mut()?.set_live_editing(enabled)
    }

    /// Commit the open draft and close the editor. On error the session
    /// stays open.
    ///
    /// # Errors
    /// Returns `EditorError` if no editor is open or the draft cannot be saved.
    pub fn save(&mut self) -> Result<ThemeRecord, EditorError> {
        let saved = self.session_mut()?.commit()?;
        self.editor = None;
        Ok(saved)
    }

    /// Rows for a theme selector: presets then custom themes.
    pub fn selector_entries(&self) -> Vec<SelectorEntry> {
        let snapshot = self.registry.snapshot();
        let themes: Vec<_> = snapshot
            .presets
            .into_iter()
            .chain(snapshot.custom_themes)
            .collect();
        selector_entries(&themes, &snapshot.active_theme_id)
    }

    /// The selector label for the active theme.
    pub fn active_theme_name(&self) -> String {
        let themes = self.registry.all_themes();
        active_theme_name(&themes, &self.registry.active_theme_id()).to_string()
    }
}
