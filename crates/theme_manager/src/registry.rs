//! The theme registry.
//!
//! [`ThemeRegistry`] is the single source of truth for the preset and custom
//! theme sets, the active theme id, and the preview overlay. It is a cheap
//! `Clone` handle: every clone shares the same state, so a registry can be
//! built once at application mount and handed to every consumer.
//!
//! Commands commit to memory first, then release the lock and talk to the
//! persistence adapter, the change callback, and registered listeners.
//! Persistence failures and panics are logged and never roll back state.
//!
//! # Example
//!
//! ```rust
//! use theme_manager::registry::ThemeRegistry;
//!
//! let registry = ThemeRegistry::builder().build();
//! assert_eq!(registry.active_theme_id(), "light");
//!
//! assert!(registry.set_active_theme("dark"));
//! assert!(!registry.set_active_theme("nope"));
//! assert_eq!(registry.resolved_record().id, "dark");
//! ```

use crate::engine::{PaletteEngine, StyleEngine, sanitize_options};
use crate::persistence::{NoPersistence, PersistenceAdapter, PersistenceError};
use crate::presets::{FALLBACK_THEME_ID, default_presets, fallback_record};
use crate::record::{ThemePatch, ThemeRecord};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, trace, warn};

/// Identifier for a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What changed in a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The active theme id was set.
    ActiveChanged { id: String },
    /// A custom theme was created or updated.
    ThemeSaved { id: String, created: bool },
    /// A custom theme was removed.
    ThemeDeleted { id: String },
    /// The preview overlay was set or cleared.
    PreviewChanged { active: bool },
}

/// Listener callback for registry changes. Receives the event and the
/// resolved record after the change.
pub trait RegistryListener: Send + Sync {
    fn on_registry_change(&self, event: &RegistryEvent, resolved: &ThemeRecord);
}

impl<F> RegistryListener for F
where
    F: Fn(&RegistryEvent, &ThemeRecord) + Send + Sync,
{
    fn on_registry_change(&self, event: &RegistryEvent, resolved: &ThemeRecord) {
        self(event, resolved);
    }
}

type ThemeChangeCallback = Arc<dyn Fn(&str, &ThemeRecord) + Send + Sync>;

/// A point-in-time copy of registry state.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot<T> {
    pub presets: Vec<ThemeRecord>,
    pub custom_themes: Vec<ThemeRecord>,
    pub active_theme_id: String,
    pub preview: Option<ThemeRecord>,
    pub resolved_record: ThemeRecord,
    pub resolved_theme: T,
}

struct RegistryState<T> {
    custom_themes: Vec<ThemeRecord>,
    active_theme_id: String,
    preview: Option<ThemeRecord>,
    resolved_record: ThemeRecord,
    resolved_theme: T,
}

struct Inner<E: StyleEngine> {
    presets: Vec<ThemeRecord>,
    engine: E,
    adapter: Arc<dyn PersistenceAdapter>,
    on_theme_change: Option<ThemeChangeCallback>,
    state: RwLock<RegistryState<E::Theme>>,
    listeners: RwLock<HashMap<ListenerId, Arc<dyn RegistryListener>>>,
    next_listener_id: AtomicU64,
    #[cfg(feature = "tokio")]
    watch: tokio::sync::watch::Sender<ThemeRecord>,
}

/// Run a persistence call, logging and swallowing errors and panics.
fn guarded<T>(op: &'static str, call: impl FnOnce() -> Result<T, PersistenceError>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(persistence.op = op, error = %err, "Persistence call failed");
            None
        }
        Err(_) => {
            warn!(persistence.op = op, "Persistence adapter panicked");
            None
        }
    }
}

impl<E: StyleEngine> Inner<E> {
    fn read(&self) -> RwLockReadGuard<'_, RegistryState<E::Theme>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState<E::Theme>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn preset(&self, id: &str) -> Option<&ThemeRecord> {
        self.presets.iter().find(|p| p.id == id)
    }

    fn first_preset_id(&self) -> &str {
        self.presets.first().map_or(FALLBACK_THEME_ID, |p| p.id.as_str())
    }

    fn lookup(&self, state: &RegistryState<E::Theme>, id: &str) -> Option<ThemeRecord> {
        self.preset(id)
            .or_else(|| state.custom_themes.iter().find(|t| t.id == id))
            .cloned()
    }

    fn render(&self, record: &ThemeRecord) -> E::Theme {
        let options = sanitize_options(&record.theme_options);
        match self.engine.build(&options) {
            Ok(theme) => theme,
            Err(err) => {
                warn!(theme.id = %record.id, error = %err, "Theme rejected by style engine");
                self.engine.fallback()
            }
        }
    }

    /// Recompute the resolved record and theme.
    fn refresh(&self, state: &mut RegistryState<E::Theme>) {
        let record = state
            .preview
            .clone()
            .or_else(|| self.lookup(state, &state.active_theme_id))
            .or_else(|| self.presets.first().cloned())
            .unwrap_or_else(fallback_record);
        state.resolved_theme = self.render(&record);
        state.resolved_record = record;
    }

    fn theme_changed(&self, id: &str, record: &ThemeRecord) {
        let Some(callback) = &self.on_theme_change else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback(id, record))).is_err() {
            warn!(theme.id = %id, "Theme change callback panicked");
        }
    }

    fn notify(&self, event: &RegistryEvent) {
        let resolved = self.read().resolved_record.clone();

        #[cfg(feature = "tokio")]
        self.watch.send_replace(resolved.clone());

        let listeners: Vec<(ListenerId, Arc<dyn RegistryListener>)> = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            listeners
                .iter()
                .map(|(id, listener)| (*id, Arc::clone(listener)))
                .collect()
        };

        for (id, listener) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| {
                listener.on_registry_change(event, &resolved);
            }));
            if result.is_err() {
                warn!(
                    registry.listener_id = id.0,
                    theme.id = %resolved.id,
                    "Registry listener panicked"
                );
            }
        }
    }
}

/// Builder for [`ThemeRegistry`].
pub struct RegistryBuilder<E: StyleEngine = PaletteEngine> {
    presets: Vec<ThemeRecord>,
    adapter: Arc<dyn PersistenceAdapter>,
    initial_active_id: Option<String>,
    on_theme_change: Option<ThemeChangeCallback>,
    engine: E,
}

impl Default for RegistryBuilder<PaletteEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder<PaletteEngine> {
    pub fn new() -> Self {
        Self {
            presets: Vec::new(),
            adapter: Arc::new(NoPersistence),
            initial_active_id: None,
            on_theme_change: None,
            engine: PaletteEngine,
        }
    }
}

impl<E: StyleEngine> RegistryBuilder<E> {
    /// Set the preset list. An empty list selects the built-in presets.
    #[must_use]
    pub fn presets(mut self, presets: impl IntoIterator<Item = ThemeRecord>) -> Self {
        self.presets = presets.into_iter().collect();
        self
    }

    /// Set the persistence adapter.
    #[must_use]
    pub fn adapter(self, adapter: impl PersistenceAdapter + 'static) -> Self {
        self.shared_adapter(Arc::new(adapter))
    }

    /// Set a persistence adapter that is shared with other owners.
    #[must_use]
    pub fn shared_adapter(mut self, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Request an initial active theme. Ignored if the id does not resolve.
    #[must_use]
    pub fn initial_active_id(mut self, id: impl Into<String>) -> Self {
        self.initial_active_id = Some(id.into());
        self
    }

    /// Called with the id and record whenever the active theme is set.
    #[must_use]
    pub fn on_theme_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &ThemeRecord) + Send + Sync + 'static,
    {
        self.on_theme_change = Some(Arc::new(callback));
        self
    }

    /// Replace the style engine.
    pub fn engine<E2: StyleEngine>(self, engine: E2) -> RegistryBuilder<E2> {
        RegistryBuilder {
            presets: self.presets,
            adapter: self.adapter,
            initial_active_id: self.initial_active_id,
            on_theme_change: self.on_theme_change,
            engine,
        }
    }

    /// Build the registry, loading persisted state from the adapter.
    pub fn build(self) -> ThemeRegistry<E> {
        let mut presets = if self.presets.is_empty() {
            default_presets()
        } else {
            self.presets
        };
        let mut seen = HashSet::new();
        presets.retain(|p| seen.insert(p.id.clone()));
        for preset in &mut presets {
            preset.is_preset = true;
        }

        let persisted = guarded("load_persisted_themes", || {
            self.adapter.load_persisted_themes()
        })
        .unwrap_or_default();
        let mut custom_themes = Vec::with_capacity(persisted.len());
        for mut theme in persisted {
            if !seen.insert(theme.id.clone()) {
                warn!(theme.id = %theme.id, "Skipping persisted theme with duplicate id");
                continue;
            }
            theme.is_preset = false;
            custom_themes.push(theme);
        }

        let resolves = |id: &str| {
            presets.iter().any(|p| p.id == id) || custom_themes.iter().any(|t| t.id == id)
        };
        let explicit = self.initial_active_id.filter(|id| {
            let ok = resolves(id);
            if !ok {
                warn!(theme.id = %id, "Ignoring unknown initial theme");
            }
            ok
        });
        let active_theme_id = explicit
            .or_else(|| {
                guarded("load_active_theme_id", || self.adapter.load_active_theme_id())
                    .flatten()
                    .filter(|id| resolves(id))
            })
            .or_else(|| presets.first().map(|p| p.id.clone()))
            .unwrap_or_else(|| FALLBACK_THEME_ID.to_string());

        let state = RegistryState {
            custom_themes,
            active_theme_id,
            preview: None,
            resolved_record: fallback_record(),
            resolved_theme: self.engine.fallback(),
        };

        #[cfg(feature = "tokio")]
        let (watch, _) = tokio::sync::watch::channel(fallback_record());

        let inner = Inner {
            presets,
            engine: self.engine,
            adapter: self.adapter,
            on_theme_change: self.on_theme_change,
            state: RwLock::new(state),
            listeners: RwLock::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
            #[cfg(feature = "tokio")]
            watch,
        };
        {
            let mut state = inner.write();
            inner.refresh(&mut state);
            #[cfg(feature = "tokio")]
            inner.watch.send_replace(state.resolved_record.clone());
            debug!(
                theme.active = %state.active_theme_id,
                theme.presets = inner.presets.len(),
                theme.custom = state.custom_themes.len(),
                "Theme registry initialized"
            );
        }

        ThemeRegistry {
            inner: Arc::new(inner),
        }
    }
}

/// Shared handle to theme state.
pub struct ThemeRegistry<E: StyleEngine = PaletteEngine> {
    inner: Arc<Inner<E>>,
}

impl<E: StyleEngine> Clone for ThemeRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: StyleEngine> fmt::Debug for ThemeRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("ThemeRegistry")
            .field("presets", &self.inner.presets.len())
            .field("custom_themes", &state.custom_themes.len())
            .field("active_theme_id", &state.active_theme_id)
            .field("preview", &state.preview.as_ref().map(|p| &p.id))
            .field(
                "listeners",
                &format!(
                    "{} listeners",
                    self.inner.listeners.read().map(|l| l.len()).unwrap_or(0)
                ),
            )
            .finish_non_exhaustive()
    }
}

impl Default for ThemeRegistry<PaletteEngine> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ThemeRegistry<PaletteEngine> {
    pub fn builder() -> RegistryBuilder<PaletteEngine> {
        RegistryBuilder::new()
    }
}

impl<E: StyleEngine> ThemeRegistry<E> {
    /// Set the active theme. Returns false and does nothing for unknown ids.
    pub fn set_active_theme(&self, id: &str) -> bool {
        let (from, record) = {
            let mut state = self.inner.write();
            let Some(record) = self.inner.lookup(&state, id) else {
                debug!(theme.id = %id, "Ignoring unknown theme id");
                return false;
            };
            let from = std::mem::replace(&mut state.active_theme_id, id.to_string());
            self.inner.refresh(&mut state);
            (from, record)
        };

        info!(theme.from = %from, theme.to = %id, "Active theme switched");
        guarded("persist_active_theme_id", || {
            self.inner.adapter.persist_active_theme_id(id)
        });
        self.inner.theme_changed(id, &record);
        self.inner.notify(&RegistryEvent::ActiveChanged { id: id.to_string() });
        true
    }

    /// Insert a custom theme, or replace the one with the same id in place.
    ///
    /// Returns false if the id belongs to a preset.
    pub fn create_custom_theme(&self, mut record: ThemeRecord) -> bool {
        if self.inner.preset(&record.id).is_some() {
            warn!(theme.id = %record.id, "Refusing to overwrite a preset");
            return false;
        }
        record.is_preset = false;

        let created = {
            let mut state = self.inner.write();
            let created = match state.custom_themes.iter_mut().find(|t| t.id == record.id) {
                Some(existing) => {
                    existing.clone_from(&record);
                    false
                }
                None => {
                    state.custom_themes.push(record.clone());
                    true
                }
            };
            self.inner.refresh(&mut state);
            created
        };

        info!(theme.id = %record.id, theme.name = %record.name, created, "Custom theme saved");
        guarded("persist_theme", || self.inner.adapter.persist_theme(&record));
        self.inner.notify(&RegistryEvent::ThemeSaved {
            id: record.id,
            created,
        });
        true
    }

    /// Merge `patch` into an existing custom theme and return the result.
    ///
    /// Unknown ids and presets are ignored.
    pub fn update_custom_theme(&self, id: &str, patch: ThemePatch) -> Option<ThemeRecord> {
        let merged = {
            let mut state = self.inner.write();
            let Some(existing) = state.custom_themes.iter_mut().find(|t| t.id == id) else {
                debug!(theme.id = %id, "Ignoring update of unknown custom theme");
                return None;
            };
            existing.apply(patch);
            let merged = existing.clone();
            self.inner.refresh(&mut state);
            merged
        };

        info!(theme.id = %id, theme.name = %merged.name, "Custom theme updated");
        guarded("persist_theme", || self.inner.adapter.persist_theme(&merged));
        self.inner.notify(&RegistryEvent::ThemeSaved {
            id: id.to_string(),
            created: false,
        });
        Some(merged)
    }

    /// Remove a custom theme. If it was active, the first preset becomes
    /// active. The persisted deletion is issued even for unknown ids.
    ///
    /// Returns true if a theme was removed from memory.
    pub fn delete_custom_theme(&self, id: &str) -> bool {
        let (removed, reassigned) = {
            let mut state = self.inner.write();
            let before = state.custom_themes.len();
            state.custom_themes.retain(|t| t.id != id);
            let removed = state.custom_themes.len() != before;

            let reassigned = if removed && state.active_theme_id == id {
                let next = self.inner.first_preset_id().to_string();
                state.active_theme_id.clone_from(&next);
                Some(next)
            } else {
                None
            };
            self.inner.refresh(&mut state);
            let reassigned = reassigned.map(|next| {
                let record = self.inner.lookup(&state, &next).unwrap_or_else(fallback_record);
                (next, record)
            });
            (removed, reassigned)
        };

        guarded("delete_persisted_theme", || {
            self.inner.adapter.delete_persisted_theme(id)
        });
        if !removed {
            debug!(theme.id = %id, "Ignoring delete of unknown custom theme");
            return false;
        }

        info!(theme.id = %id, "Custom theme deleted");
        if let Some((next, record)) = reassigned {
            info!(theme.from = %id, theme.to = %next, "Active theme switched");
            guarded("persist_active_theme_id", || {
                self.inner.adapter.persist_active_theme_id(&next)
            });
            self.inner.theme_changed(&next, &record);
            self.inner.notify(&RegistryEvent::ThemeDeleted { id: id.to_string() });
            self.inner.notify(&RegistryEvent::ActiveChanged { id: next });
        } else {
            self.inner.notify(&RegistryEvent::ThemeDeleted { id: id.to_string() });
        }
        true
    }

    /// Set or clear the preview overlay. Never persisted.
    pub fn set_preview_theme(&self, preview: Option<ThemeRecord>) {
        let active = preview.is_some();
        {
            let mut state = self.inner.write();
            if state.preview.is_none() && preview.is_none() {
                return;
            }
            state.preview = preview;
            self.inner.refresh(&mut state);
        }
        debug!(theme.preview = active, "Preview changed");
        self.inner.notify(&RegistryEvent::PreviewChanged { active });
    }

    /// Register a listener for registry changes.
    pub fn on_change<L>(&self, listener: L) -> ListenerId
    where
        L: RegistryListener + 'static,
    {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));
        debug!(registry.listener_id = id.0, "Registry listener registered");
        id
    }

    /// Remove a listener by id.
    pub fn remove_listener(&self, id: ListenerId) {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.remove(&id).is_some() {
            debug!(registry.listener_id = id.0, "Registry listener removed");
        }
    }

    /// Watch the resolved record.
    #[cfg(feature = "tokio")]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<ThemeRecord> {
        self.inner.watch.subscribe()
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    /// The preset records, in registration order.
    pub fn presets(&self) -> &[ThemeRecord] {
        &self.inner.presets
    }

    pub fn custom_themes(&self) -> Vec<ThemeRecord> {
        self.inner.read().custom_themes.clone()
    }

    /// Presets followed by custom themes.
    pub fn all_themes(&self) -> Vec<ThemeRecord> {
        let state = self.inner.read();
        self.inner
            .presets
            .iter()
            .chain(&state.custom_themes)
            .cloned()
            .collect()
    }

    /// Look up a theme in presets, then custom themes.
    pub fn find(&self, id: &str) -> Option<ThemeRecord> {
        let state = self.inner.read();
        self.inner.lookup(&state, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.is_preset(id) || self.is_custom(id)
    }

    pub fn is_preset(&self, id: &str) -> bool {
        self.inner.preset(id).is_some()
    }

    pub fn is_custom(&self, id: &str) -> bool {
        self.inner.read().custom_themes.iter().any(|t| t.id == id)
    }

    pub fn active_theme_id(&self) -> String {
        self.inner.read().active_theme_id.clone()
    }

    /// The committed active record, ignoring any preview.
    pub fn active_record(&self) -> ThemeRecord {
        let state = self.inner.read();
        self.inner
            .lookup(&state, &state.active_theme_id)
            .or_else(|| self.inner.presets.first().cloned())
            .unwrap_or_else(fallback_record)
    }

    pub fn preview(&self) -> Option<ThemeRecord> {
        self.inner.read().preview.clone()
    }

    /// The record currently rendered: the preview if set, else the active
    /// record.
    pub fn resolved_record(&self) -> ThemeRecord {
        let state = self.inner.read();
        trace!(theme.id = %state.resolved_record.id, "Resolved record read");
        state.resolved_record.clone()
    }

    /// The engine output for [`Self::resolved_record`].
    pub fn resolved_theme(&self) -> E::Theme {
        self.inner.read().resolved_theme.clone()
    }

    pub fn snapshot(&self) -> RegistrySnapshot<E::Theme> {
        let state = self.inner.read();
        RegistrySnapshot {
            presets: self.inner.presets.clone(),
            custom_themes: state.custom_themes.clone(),
            active_theme_id: state.active_theme_id.clone(),
            preview: state.preview.clone(),
            resolved_record: state.resolved_record.clone(),
            resolved_theme: state.resolved_theme.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PaletteMode, ThemeOptions};
    use crate::persistence::{KeyValuePersistence, MemoryStore};
    use serde_json::json;
    use std::sync::Mutex;

    fn custom(id: &str, name: &str) -> ThemeRecord {
        ThemeRecord::new(
            id,
            name,
            ThemeOptions::from(json!({
                "palette": { "mode": "light", "primary": { "main": "#ff5722" } }
            })),
        )
    }

    #[test]
    fn test_defaults_to_first_preset() {
        let registry = ThemeRegistry::builder().build();
        assert_eq!(registry.active_theme_id(), "light");
        assert_eq!(registry.resolved_record().id, "light");
        assert!(registry.custom_themes().is_empty());
        assert_eq!(registry.presets().len(), 3);
    }

    #[test]
    fn test_initial_id_must_resolve() {
        let registry = ThemeRegistry::builder().initial_active_id("dark").build();
        assert_eq!(registry.active_theme_id(), "dark");

        let registry = ThemeRegistry::builder().initial_active_id("ghost").build();
        assert_eq!(registry.active_theme_id(), "light");
    }

    #[test]
    fn test_explicit_initial_id_beats_persisted() {
        let store = MemoryStore::new();
        let adapter = KeyValuePersistence::new(store.clone());
        adapter.persist_active_theme_id("ocean").expect("persist");

        let registry = ThemeRegistry::builder()
            .adapter(KeyValuePersistence::new(store.clone()))
            .initial_active_id("dark")
            .build();
        assert_eq!(registry.active_theme_id(), "dark");

        let registry = ThemeRegistry::builder()
            .adapter(KeyValuePersistence::new(store))
            .build();
        assert_eq!(registry.active_theme_id(), "ocean");
    }

    #[test]
    fn test_stale_persisted_id_falls_back() {
        let adapter = KeyValuePersistence::new(MemoryStore::new());
        adapter.persist_active_theme_id("deleted-theme").expect("persist");
        let registry = ThemeRegistry::builder().adapter(adapter).build();
        assert_eq!(registry.active_theme_id(), "light");
    }

    #[test]
    fn test_custom_presets_are_forced_read_only() {
        let registry = ThemeRegistry::builder()
            .presets([custom("brand", "Brand"), custom("brand", "Dupe")])
            .build();
        assert_eq!(registry.presets().len(), 1);
        assert!(registry.presets()[0].is_preset);
        assert_eq!(registry.presets()[0].name, "Brand");
        assert_eq!(registry.active_theme_id(), "brand");
    }

    #[test]
    fn test_loaded_themes_are_cleaned() {
        let adapter = KeyValuePersistence::new(MemoryStore::new());
        adapter.persist_theme(&custom("c1", "One").as_preset()).expect("persist");
        adapter.persist_theme(&custom("dark", "Shadow")).expect("persist");
        adapter.persist_theme(&custom("c2", "Two")).expect("persist");

        let registry = ThemeRegistry::builder().adapter(adapter).build();
        let custom = registry.custom_themes();
        let ids: Vec<_> = custom.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2"]);
        assert!(custom.iter().all(|t| !t.is_preset));
        assert_eq!(registry.find("dark").expect("preset").name, "Dark");
    }

    #[test]
    fn test_set_active_unknown_is_noop() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        let registry = ThemeRegistry::builder()
            .on_theme_change(move |id, _| seen.lock().expect("lock").push(id.to_string()))
            .build();

        assert!(!registry.set_active_theme("missing"));
        assert!(registry.set_active_theme("ocean"));
        assert_eq!(*calls.lock().expect("lock"), ["ocean"]);
        assert_eq!(registry.active_theme_id(), "ocean");
    }

    #[test]
    fn test_create_is_idempotent_and_keeps_position() {
        let registry = ThemeRegistry::builder().build();
        assert!(registry.create_custom_theme(custom("a", "A")));
        assert!(registry.create_custom_theme(custom("b", "B")));
        assert!(registry.create_custom_theme(custom("a", "A2")));
        assert!(registry.create_custom_theme(custom("a", "A2")));

        let names: Vec<_> = registry.custom_themes().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["A2", "B"]);
    }

    #[test]
    fn test_create_rejects_preset_ids() {
        let registry = ThemeRegistry::builder().build();
        assert!(!registry.create_custom_theme(custom("dark", "Hijack")));
        assert!(registry.custom_themes().is_empty());
        assert_eq!(registry.find("dark").expect("preset").name, "Dark");
    }

    #[test]
    fn test_create_clears_preset_flag() {
        let registry = ThemeRegistry::builder().build();
        registry.create_custom_theme(custom("c", "C").as_preset());
        assert!(!registry.find("c").expect("custom").is_preset);
    }

    #[test]
    fn test_update_merges_and_ignores_unknown() {
        let registry = ThemeRegistry::builder().build();
        registry.create_custom_theme(custom("c", "C").with_description("keep"));

        let merged = registry
            .update_custom_theme("c", ThemePatch::new().name("Renamed"))
            .expect("updated");
        assert_eq!(merged.name, "Renamed");
        assert_eq!(merged.description.as_deref(), Some("keep"));

        assert!(registry.update_custom_theme("nope", ThemePatch::new().name("X")).is_none());
        assert!(registry.update_custom_theme("dark", ThemePatch::new().name("X")).is_none());
        assert_eq!(registry.find("dark").expect("preset").name, "Dark");
    }

    #[test]
    fn test_update_of_active_theme_rerenders() {
        let registry = ThemeRegistry::builder().build();
        registry.create_custom_theme(custom("c", "C"));
        registry.set_active_theme("c");
        assert_eq!(registry.resolved_theme().primary.main, "#ff5722");

        let options = registry
            .find("c")
            .expect("custom")
            .theme_options
            .with_value("palette.primary.main", "#00ff00");
        registry.update_custom_theme("c", ThemePatch::new().theme_options(options));
        assert_eq!(registry.resolved_theme().primary.main, "#00ff00");
    }

    #[test]
    fn test_delete_active_reassigns_to_first_preset() {
        let registry = ThemeRegistry::builder().build();
        registry.create_custom_theme(custom("c", "C"));
        registry.set_active_theme("c");

        assert!(registry.delete_custom_theme("c"));
        assert_eq!(registry.active_theme_id(), "light");
        assert_eq!(registry.resolved_record().id, "light");
        assert!(registry.find("c").is_none());
    }

    #[derive(Default)]
    struct DeleteLog(Mutex<Vec<String>>);

    impl PersistenceAdapter for DeleteLog {
        fn delete_persisted_theme(&self, id: &str) -> Result<(), PersistenceError> {
            self.0.lock().expect("lock").push(id.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_delete_unknown_still_reaches_storage() {
        let log = Arc::new(DeleteLog::default());
        let registry = ThemeRegistry::builder().shared_adapter(log.clone()).build();
        registry.create_custom_theme(custom("c", "C"));

        assert!(!registry.delete_custom_theme("orphan"));
        assert!(registry.delete_custom_theme("c"));
        assert!(!registry.delete_custom_theme("c"));
        assert_eq!(*log.0.lock().expect("lock"), ["orphan", "c", "c"]);
        assert_eq!(registry.active_theme_id(), "light");
    }

    #[test]
    fn test_preview_overlays_without_commit() {
        let registry = ThemeRegistry::builder().initial_active_id("dark").build();
        let before = registry.resolved_theme();

        let preview = custom("draft", "Draft");
        registry.set_preview_theme(Some(preview.clone()));
        assert_eq!(registry.resolved_record(), preview);
        assert_eq!(registry.active_theme_id(), "dark");
        assert_eq!(registry.active_record().id, "dark");
        assert!(registry.custom_themes().is_empty());

        registry.set_preview_theme(None);
        assert_eq!(registry.resolved_theme(), before);
        assert_eq!(registry.resolved_theme().mode, PaletteMode::Dark);
    }

    #[test]
    fn test_rejected_theme_renders_fallback() {
        let registry = ThemeRegistry::builder().build();
        let broken = custom("broken", "Broken").with_option("palette.primary", "not-an-object");
        registry.create_custom_theme(broken);
        assert!(registry.set_active_theme("broken"));
        assert_eq!(registry.resolved_record().id, "broken");
        assert_eq!(registry.resolved_theme(), PaletteEngine.fallback());
    }

    #[test]
    fn test_listeners_receive_events() {
        let registry = ThemeRegistry::builder().build();
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        let id = registry.on_change(move |event: &RegistryEvent, resolved: &ThemeRecord| {
            seen.lock()
                .expect("lock")
                .push((event.clone(), resolved.id.clone()));
        });

        registry.create_custom_theme(custom("c", "C"));
        registry.set_active_theme("c");
        registry.delete_custom_theme("c");
        registry.remove_listener(id);
        registry.set_active_theme("dark");

        let events = events.lock().expect("lock");
        assert_eq!(
            *events,
            [
                (
                    RegistryEvent::ThemeSaved {
                        id: "c".into(),
                        created: true
                    },
                    "light".to_string()
                ),
                (RegistryEvent::ActiveChanged { id: "c".into() }, "c".to_string()),
                (RegistryEvent::ThemeDeleted { id: "c".into() }, "light".to_string()),
                (RegistryEvent::ActiveChanged { id: "light".into() }, "light".to_string()),
            ]
        );
    }

    #[test]
    fn test_listener_panic_is_contained() {
        let registry = ThemeRegistry::builder().build();
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        registry.on_change(|_: &RegistryEvent, _: &ThemeRecord| panic!("listener boom"));
        registry.on_change(move |_: &RegistryEvent, _: &ThemeRecord| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.set_active_theme("dark"));
        assert_eq!(registry.active_theme_id(), "dark");
        assert!(registry.set_active_theme("light"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ThemeRegistry::builder().build();
        let other = registry.clone();
        other.set_active_theme("ocean");
        assert_eq!(registry.active_theme_id(), "ocean");
    }

    #[test]
    fn test_snapshot_matches_reads() {
        let registry = ThemeRegistry::builder().build();
        registry.create_custom_theme(custom("c", "C"));
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.presets, registry.presets());
        assert_eq!(snapshot.custom_themes, registry.custom_themes());
        assert_eq!(snapshot.active_theme_id, "light");
        assert!(snapshot.preview.is_none());
        assert_eq!(snapshot.resolved_theme, registry.resolved_theme());
        assert_eq!(registry.all_themes().len(), 4);
        assert!(registry.contains("c") && registry.is_custom("c") && !registry.is_preset("c"));
    }

    #[cfg(feature = "tokio")]
    #[test]
    fn test_subscribe_tracks_resolved_record() {
        let registry = ThemeRegistry::builder().build();
        let mut rx = registry.subscribe();
        assert_eq!(rx.borrow_and_update().id, "light");

        registry.set_active_theme("dark");
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().id, "dark");
    }
}
