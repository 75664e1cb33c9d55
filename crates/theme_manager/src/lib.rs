#![forbid(unsafe_code)]
// Allow these clippy lints for API ergonomics
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::use_self)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::single_match_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::significant_drop_tightening)]

//! # Theme Manager
//!
//! Runtime theme management for component UI toolkits:
//!
//! - **Registry**: read-only presets plus user-defined custom themes, an
//!   active theme that always resolves, and a preview overlay
//! - **Draft editing**: structured field edits and raw JSON edits on an
//!   isolated copy, with optional live preview
//! - **Persistence**: a pluggable adapter, with in-memory and file-backed
//!   key-value storage out of the box
//! - **Style engine**: a boundary that turns option documents into
//!   renderable themes
//!
//! ## Quick Start
//!
//! ```rust
//! use theme_manager::{KeyValuePersistence, MemoryStore, ThemeManager, ThemeRegistry};
//!
//! let registry = ThemeRegistry::builder()
//!     .adapter(KeyValuePersistence::new(MemoryStore::new()))
//!     .build();
//! let mut manager = ThemeManager::new(registry).with_live_editing(true);
//!
//! let ocean = manager.registry().find("ocean").unwrap();
//! manager.open_new_theme(Some(&ocean));
//! manager.set_draft_name("Deep Ocean").unwrap();
//! manager.update_draft_field("palette.primary.main", "#01579b").unwrap();
//!
//! // Live editing renders the draft without committing it.
//! assert_eq!(manager.state().resolved_theme.primary.main, "#01579b");
//!
//! let saved = manager.save().unwrap();
//! manager.select_theme(&saved.id);
//! assert_eq!(manager.state().active_theme_id, saved.id);
//! ```
//!
//! ## Configuration
//!
//! A [`ManagerConfig`] can be loaded from TOML or JSON and turned into a
//! manager with durable file storage:
//!
//! ```rust,no_run
//! use theme_manager::ManagerConfig;
//!
//! let config = ManagerConfig::from_file("themes.toml").unwrap();
//! let manager = config.into_manager().unwrap();
//! ```

pub mod color;
pub mod config;
pub mod document;
pub mod editor;
pub mod engine;
pub mod fields;
pub mod manager;
pub mod persistence;
pub mod presets;
pub mod record;
pub mod registry;

pub use config::{ConfigError, ManagerConfig, StorageBackend, StorageConfig};
pub use document::{PaletteMode, ThemeOptions};
pub use editor::{DraftMode, DraftSession, EditorError, EditorSnapshot};
pub use engine::{EngineError, PaletteEngine, RenderTheme, StyleEngine, sanitize_options};
pub use fields::{ADVANCED_COLOR_FIELDS, BASIC_COLOR_FIELDS, ColorField, SelectorEntry};
pub use manager::{ManagerState, ThemeManager};
pub use persistence::{
    FileStore, KeyValuePersistence, KeyValueStore, MemoryStore, NoPersistence,
    PersistenceAdapter, PersistenceError, StorageKeys,
};
pub use presets::{BuiltinPreset, default_presets};
pub use record::{ThemePatch, ThemeRecord};
pub use registry::{
    ListenerId, RegistryBuilder, RegistryEvent, RegistryListener, RegistrySnapshot, ThemeRegistry,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::document::{PaletteMode, ThemeOptions};
    pub use crate::editor::EditorError;
    pub use crate::manager::ThemeManager;
    pub use crate::record::{ThemePatch, ThemeRecord};
    pub use crate::registry::ThemeRegistry;
}
