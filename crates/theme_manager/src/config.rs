//! Manager configuration.
//!
//! ```toml
//! initial_theme = "dark"
//! live_editing = true
//!
//! [storage]
//! backend = "file"
//! dir = "/var/lib/app/themes"
//!
//! [storage.keys]
//! custom_themes = "app-themes"
//! ```

use crate::manager::ThemeManager;
use crate::persistence::{
    FileStore, KeyValuePersistence, MemoryStore, NoPersistence, PersistenceAdapter, StorageKeys,
};
use crate::record::ThemeRecord;
use crate::registry::{RegistryBuilder, ThemeRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Error loading or applying configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("file storage needs a `dir`")]
    MissingStorageDir,
}

/// Where custom themes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Kept for the lifetime of the process.
    #[default]
    Memory,
    /// One file per key under `dir`.
    File,
    /// Nothing is stored.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub dir: Option<PathBuf>,
    pub keys: StorageKeys,
}

/// Top-level configuration for a [`ThemeManager`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub storage: StorageConfig,
    /// Requested initial theme; ignored if it does not resolve.
    pub initial_theme: Option<String>,
    /// Whether editor sessions start with live editing on.
    pub live_editing: bool,
    /// Preset records. Empty selects the built-in presets.
    pub presets: Vec<ThemeRecord>,
}

impl ManagerConfig {
    /// Parse configuration from TOML.
    ///
    /// # Errors
    /// Returns `ConfigError` if parsing fails.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Parse configuration from JSON.
    ///
    /// # Errors
    /// Returns `ConfigError` if parsing fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a file, choosing the format by extension.
    ///
    /// # Errors
    /// Returns `ConfigError` if reading or parsing fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.into())),
            None => Err(ConfigError::UnsupportedFormat("unknown".into())),
        }
    }

    /// Build the configured persistence adapter.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingStorageDir` for file storage without a
    /// directory.
    pub fn adapter(&self) -> Result<Arc<dyn PersistenceAdapter>, ConfigError> {
        let keys = self.storage.keys.clone();
        let adapter: Arc<dyn PersistenceAdapter> = match self.storage.backend {
            StorageBackend::Memory => {
                Arc::new(KeyValuePersistence::with_keys(MemoryStore::new(), keys))
            }
            StorageBackend::File => {
                let dir = self.storage.dir.clone().ok_or(ConfigError::MissingStorageDir)?;
                debug!(storage.dir = %dir.display(), "Using file theme storage");
                Arc::new(KeyValuePersistence::with_keys(FileStore::new(dir), keys))
            }
            StorageBackend::None => Arc::new(NoPersistence),
        };
        Ok(adapter)
    }

    /// A registry builder with presets, storage, and initial theme applied.
    ///
    /// # Errors
    /// Returns `ConfigError` if the storage backend cannot be built.
    pub fn registry_builder(&self) -> Result<RegistryBuilder, ConfigError> {
        let mut builder = ThemeRegistry::builder()
            .presets(self.presets.iter().cloned())
            .shared_adapter(self.adapter()?);
        if let Some(id) = &self.initial_theme {
            builder = builder.initial_active_id(id.clone());
        }
        Ok(builder)
    }

    /// Build a manager from this configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if the storage backend cannot be built.
    pub fn into_manager(self) -> Result<ThemeManager, ConfigError> {
        let registry = self.registry_builder()?.build();
        Ok(ThemeManager::new(registry).with_live_editing(self.live_editing))
    }
}
