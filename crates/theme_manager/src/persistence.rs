//! Persistence of custom themes and the active theme id.
//!
//! The registry talks to storage only through [`PersistenceAdapter`]. Every
//! method has a default implementation, so a host can implement just the
//! calls it cares about. Failures are reported as [`PersistenceError`] and
//! the registry logs and ignores them; local theme state never depends on the
//! storage backend being available.
//!
//! [`KeyValuePersistence`] is the default backend. It stores a JSON array of
//! custom records under one key and the plain active id under another, on
//! top of any [`KeyValueStore`]: [`MemoryStore`] for session-scoped storage
//! or [`FileStore`] for durable storage in a directory.

use crate::record::ThemeRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Default key holding the serialized custom themes.
pub const CUSTOM_THEMES_KEY: &str = "theme-manager-custom-themes";

/// Default key holding the active theme id.
pub const ACTIVE_THEME_KEY: &str = "theme-manager-active-theme-id";

/// Error reading or writing persisted theme state.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage contract consumed by the theme registry.
pub trait PersistenceAdapter: Send + Sync {
    /// Load all persisted custom themes.
    ///
    /// # Errors
    /// Returns `PersistenceError` if storage cannot be read.
    fn load_persisted_themes(&self) -> Result<Vec<ThemeRecord>, PersistenceError> {
        Ok(Vec::new())
    }

    /// Insert or replace a custom theme by id.
    ///
    /// # Errors
    /// Returns `PersistenceError` if storage cannot be written.
    fn persist_theme(&self, _theme: &ThemeRecord) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// Remove a custom theme by id.
    ///
    /// # Errors
    /// Returns `PersistenceError` if storage cannot be written.
    fn delete_persisted_theme(&self, _id: &str) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// Load the persisted active theme id.
    ///
    /// # Errors
    /// Returns `PersistenceError` if storage cannot be read.
    fn load_active_theme_id(&self) -> Result<Option<String>, PersistenceError> {
        Ok(None)
    }

    /// Persist the active theme id.
    ///
    /// # Errors
    /// Returns `PersistenceError` if storage cannot be written.
    fn persist_active_theme_id(&self, _id: &str) -> Result<(), PersistenceError> {
        Ok(())
    }
}

impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for Arc<T> {
    fn load_persisted_themes(&self) -> Result<Vec<ThemeRecord>, PersistenceError> {
        (**self).load_persisted_themes()
    }

    fn persist_theme(&self, theme: &ThemeRecord) -> Result<(), PersistenceError> {
        (**self).persist_theme(theme)
    }

    fn delete_persisted_theme(&self, id: &str) -> Result<(), PersistenceError> {
        (**self).delete_persisted_theme(id)
    }

    fn load_active_theme_id(&self) -> Result<Option<String>, PersistenceError> {
        (**self).load_active_theme_id()
    }

    fn persist_active_theme_id(&self, id: &str) -> Result<(), PersistenceError> {
        (**self).persist_active_theme_id(id)
    }
}

/// An adapter that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl PersistenceAdapter for NoPersistence {}

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write a value.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store scoped to the lifetime of the process.
///
/// Clones share the same entries, so a store can outlive one registry and be
/// handed to the next.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Durable store keeping one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for `key`. Bytes outside `[A-Za-z0-9_-]` are written as
    /// `%XX`, so distinct keys never share a file and no key can leave `dir`.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        trace!(store.path = %path.display(), "Store entry written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Storage key names used by [`KeyValuePersistence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub custom_themes: String,
    pub active_theme: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            custom_themes: CUSTOM_THEMES_KEY.to_string(),
            active_theme: ACTIVE_THEME_KEY.to_string(),
        }
    }
}

/// The default persistence backend over a key-value store.
#[derive(Debug, Clone)]
pub struct KeyValuePersistence<S> {
    store: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> KeyValuePersistence<S> {
    /// Use the default key names.
    pub fn new(store: S) -> Self {
        Self::with_keys(store, StorageKeys::default())
    }

    pub fn with_keys(store: S, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Read the stored records. `None` means the stored value is malformed.
    fn read_themes(&self) -> Result<Option<Vec<ThemeRecord>>, PersistenceError> {
        let Some(raw) = self.store.get(&self.keys.custom_themes)? else {
            return Ok(Some(Vec::new()));
        };
        match serde_json::from_str(&raw) {
            Ok(themes) => Ok(Some(themes)),
            Err(err) => {
                warn!(
                    store.key = %self.keys.custom_themes,
                    error = %err,
                    "Stored themes are malformed"
                );
                Ok(None)
            }
        }
    }

    /// Rewrite the stored array with `update`. Malformed stored data is left
    /// untouched and the write is skipped.
    fn rewrite_themes(
        &self,
        update: impl FnOnce(&mut Vec<ThemeRecord>),
    ) -> Result<(), PersistenceError> {
        let Some(mut themes) = self.read_themes()? else {
            warn!(
                store.key = %self.keys.custom_themes,
                "Skipping write over malformed stored themes"
            );
            return Ok(());
        };
        update(&mut themes);
        self.write_themes(&themes)
    }

    fn write_themes(&self, themes: &[ThemeRecord]) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(themes)?;
        self.store.set(&self.keys.custom_themes, &raw)
    }
}

impl<S: KeyValueStore> PersistenceAdapter for KeyValuePersistence<S> {
    fn load_persisted_themes(&self) -> Result<Vec<ThemeRecord>, PersistenceError> {
        let themes = self.read_themes()?.unwrap_or_default();
        debug!(theme.count = themes.len(), "Loaded persisted themes");
        Ok(themes)
    }

    fn persist_theme(&self, theme: &ThemeRecord) -> Result<(), PersistenceError> {
        self.rewrite_themes(|themes| match themes.iter_mut().find(|t| t.id == theme.id) {
            Some(existing) => existing.clone_from(theme),
            None => themes.push(theme.clone()),
        })
    }

    fn delete_persisted_theme(&self, id: &str) -> Result<(), PersistenceError> {
        self.rewrite_themes(|themes| themes.retain(|t| t.id != id))
    }

    fn load_active_theme_id(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .store
            .get(&self.keys.active_theme)?
            .filter(|id| !id.is_empty()))
    }

    fn persist_active_theme_id(&self, id: &str) -> Result<(), PersistenceError> {
        self.store.set(&self.keys.active_theme, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ThemeOptions;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> ThemeRecord {
        ThemeRecord::new(
            id,
            name,
            ThemeOptions::from(json!({ "palette": { "mode": "light" } })),
        )
    }

    #[test]
    fn test_no_persistence_defaults() {
        let adapter = NoPersistence;
        assert!(adapter.load_persisted_themes().expect("load").is_empty());
        assert!(adapter.load_active_theme_id().expect("load").is_none());
        adapter.persist_theme(&record("a", "A")).expect("persist");
    }

    #[test]
    fn test_upsert_preserves_position() {
        let adapter = KeyValuePersistence::new(MemoryStore::new());
        adapter.persist_theme(&record("a", "A")).expect("persist a");
        adapter.persist_theme(&record("b", "B")).expect("persist b");
        adapter.persist_theme(&record("a", "A2")).expect("update a");

        let themes = adapter.load_persisted_themes().expect("load");
        let names: Vec<_> = themes.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["A2", "B"]);
    }

    #[test]
    fn test_delete_removes_only_target() {
        let adapter = KeyValuePersistence::new(MemoryStore::new());
        adapter.persist_theme(&record("a", "A")).expect("persist a");
        adapter.persist_theme(&record("b", "B")).expect("persist b");
        adapter.delete_persisted_theme("a").expect("delete");
        adapter.delete_persisted_theme("missing").expect("delete missing");

        let ids: Vec<_> = adapter
            .load_persisted_themes()
            .expect("load")
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["b"]);
    }

    #[test]
    fn test_malformed_themes_read_as_empty() {
        let store = MemoryStore::new();
        store.set(CUSTOM_THEMES_KEY, "{not json").expect("set");
        let adapter = KeyValuePersistence::new(store);
        assert!(adapter.load_persisted_themes().expect("load").is_empty());
    }

    #[test]
    fn test_malformed_themes_are_not_overwritten() {
        let store = MemoryStore::new();
        store.set(CUSTOM_THEMES_KEY, "{not json").expect("set");
        let adapter = KeyValuePersistence::new(store.clone());

        adapter.persist_theme(&record("a", "A")).expect("persist");
        adapter.delete_persisted_theme("a").expect("delete");
        assert_eq!(
            store.get(CUSTOM_THEMES_KEY).expect("get").as_deref(),
            Some("{not json")
        );

        // The active id lives under its own key and is still written.
        adapter.persist_active_theme_id("a").expect("persist id");
        assert_eq!(adapter.load_active_theme_id().expect("load").as_deref(), Some("a"));
    }

    #[test]
    fn test_active_id_roundtrip() {
        let adapter = KeyValuePersistence::new(MemoryStore::new());
        assert_eq!(adapter.load_active_theme_id().expect("load"), None);
        adapter.persist_active_theme_id("dark").expect("persist");
        assert_eq!(
            adapter.load_active_theme_id().expect("load").as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn test_empty_active_id_is_absent() {
        let store = MemoryStore::new();
        store.set(ACTIVE_THEME_KEY, "").expect("set");
        let adapter = KeyValuePersistence::new(store);
        assert_eq!(adapter.load_active_theme_id().expect("load"), None);
    }

    #[test]
    fn test_custom_keys() {
        let store = MemoryStore::new();
        let keys = StorageKeys {
            custom_themes: "app.themes".into(),
            active_theme: "app.active".into(),
        };
        let adapter = KeyValuePersistence::with_keys(store.clone(), keys);
        adapter.persist_active_theme_id("ocean").expect("persist");
        assert_eq!(store.get("app.active").expect("get").as_deref(), Some("ocean"));
        assert_eq!(store.get(ACTIVE_THEME_KEY).expect("get"), None);
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.set("k", "v").expect("set");
        assert_eq!(clone.get("k").expect("get").as_deref(), Some("v"));
        clone.remove("k").expect("remove");
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileStore::new(dir.path().join("themes"));
        assert_eq!(store.get("missing").expect("get"), None);

        store.set(CUSTOM_THEMES_KEY, "[]").expect("set");
        assert_eq!(store.get(CUSTOM_THEMES_KEY).expect("get").as_deref(), Some("[]"));

        store.remove(CUSTOM_THEMES_KEY).expect("remove");
        store.remove(CUSTOM_THEMES_KEY).expect("remove twice");
        assert_eq!(store.get(CUSTOM_THEMES_KEY).expect("get"), None);
    }

    #[test]
    fn test_file_store_sanitizes_key_names() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().join("store");
        let store = FileStore::new(&root);
        store.set("../escape/attempt", "x").expect("set");

        assert!(root.join("%2E%2E%2Fescape%2Fattempt").exists());
        assert_eq!(store.get("../escape/attempt").expect("get").as_deref(), Some("x"));

        let outside: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(outside, ["store"]);
        assert_eq!(fs::read_dir(&root).expect("read dir").count(), 1);
    }

    #[test]
    fn test_file_store_keys_do_not_collide() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileStore::new(dir.path());
        let keys = StorageKeys {
            custom_themes: "app.themes".into(),
            active_theme: "app_themes".into(),
        };
        let adapter = KeyValuePersistence::with_keys(store.clone(), keys);

        adapter.persist_theme(&record("custom-1", "Mine")).expect("persist");
        adapter.persist_active_theme_id("custom-1").expect("persist id");

        let themes = adapter.load_persisted_themes().expect("load");
        assert_eq!(themes, vec![record("custom-1", "Mine")]);
        assert_eq!(
            adapter.load_active_theme_id().expect("load").as_deref(),
            Some("custom-1")
        );

        store.set("100%", "a").expect("set");
        store.set("100%25", "b").expect("set");
        assert_eq!(store.get("100%").expect("get").as_deref(), Some("a"));
        assert_eq!(store.get("100%25").expect("get").as_deref(), Some("b"));
    }

    #[test]
    fn test_file_backed_adapter_persists_records() {
        let dir = TempDir::new().expect("tempdir");
        let first = KeyValuePersistence::new(FileStore::new(dir.path()));
        first.persist_theme(&record("custom-1", "Mine")).expect("persist");
        first.persist_active_theme_id("custom-1").expect("persist id");

        let second = KeyValuePersistence::new(FileStore::new(dir.path()));
        let themes = second.load_persisted_themes().expect("load");
        assert_eq!(themes, vec![record("custom-1", "Mine")]);
        assert_eq!(
            second.load_active_theme_id().expect("load").as_deref(),
            Some("custom-1")
        );
    }
}
