//! Configuration for opening a graph instance.
//!
//! A [`GraphConfig`] names the instance prefix, tunes id generation and scan
//! paging, and selects the store substrate. It can be built in code or loaded
//! from JSON:
//!
//! ```rust
//! use tablegraph::{BackendKind, GraphConfig};
//!
//! let cfg = GraphConfig::from_json_str(r#"{ "prefix": "social", "backend": "Memory" }"#)?;
//! assert_eq!(cfg.prefix, "social");
//! assert_eq!(cfg.backend, BackendKind::Memory);
//! assert_eq!(cfg.id_length, 24);
//! # Ok::<(), tablegraph::GraphStoreError>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{GraphStoreError, Result};
use crate::graph::GraphStore;
use crate::store::{AnyStore, MemoryStore};

pub const DEFAULT_ID_LENGTH: usize = 24;
pub const DEFAULT_SCAN_CACHING: usize = 8192;

/// Store substrate selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Sorted in-process tables; nothing survives the process.
    Memory,
    /// SQLite database, file-backed or in-memory.
    #[default]
    SQLite,
}

/// Options for the SQLite substrate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file; `None` opens an in-memory database.
    pub path: Option<PathBuf>,

    /// Extra `PRAGMA key = value` statements applied after opening.
    pub pragma_settings: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Instance prefix; escaped before it is used in table names.
    pub prefix: String,

    /// Length in bytes of generated vertex and edge ids.
    pub id_length: usize,

    /// Rows fetched per substrate round-trip by scans.
    pub scan_caching: usize,

    /// Create missing base tables when opening.
    pub create_tables: bool,

    pub backend: BackendKind,

    pub sqlite: SqliteConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            prefix: "tablegraph".to_string(),
            id_length: DEFAULT_ID_LENGTH,
            scan_caching: DEFAULT_SCAN_CACHING,
            create_tables: true,
            backend: BackendKind::default(),
            sqlite: SqliteConfig::default(),
        }
    }
}

impl GraphConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn memory(prefix: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::new(prefix)
        }
    }

    pub fn sqlite(prefix: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::SQLite,
            ..Self::new(prefix)
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GraphStoreError::invalid_input(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(GraphStoreError::invalid_input("prefix must not be empty"));
        }
        if self.id_length == 0 {
            return Err(GraphStoreError::invalid_input("id_length must be positive"));
        }
        if self.scan_caching == 0 {
            return Err(GraphStoreError::invalid_input("scan_caching must be positive"));
        }
        Ok(())
    }
}

/// A graph over whichever substrate the configuration selects.
pub type AnyGraph = GraphStore<AnyStore>;

/// Opens the substrate named by `cfg` and the graph instance on top of it.
pub fn open_graph(cfg: &GraphConfig) -> Result<AnyGraph> {
    cfg.validate()?;
    let store = match cfg.backend {
        BackendKind::Memory => AnyStore::Memory(MemoryStore::new()),
        #[cfg(feature = "sqlite-backend")]
        BackendKind::SQLite => {
            let store = match &cfg.sqlite.path {
                Some(path) => crate::store::SqliteStore::open(path)?,
                None => crate::store::SqliteStore::open_in_memory()?,
            };
            for (key, value) in &cfg.sqlite.pragma_settings {
                store.apply_pragma(key, value)?;
            }
            AnyStore::Sqlite(store)
        }
        #[cfg(not(feature = "sqlite-backend"))]
        BackendKind::SQLite => {
            return Err(GraphStoreError::invalid_input(
                "built without the sqlite-backend feature",
            ));
        }
    };
    info!(prefix = %cfg.prefix, backend = ?cfg.backend, "opening graph");
    GraphStore::open(store, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GraphConfig::default();
        assert_eq!(cfg.id_length, 24);
        assert_eq!(cfg.scan_caching, 8192);
        assert!(cfg.create_tables);
        assert_eq!(cfg.backend, BackendKind::SQLite);
        assert!(cfg.sqlite.path.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg = GraphConfig::from_json_str(r#"{"prefix": "p", "scan_caching": 16}"#).unwrap();
        assert_eq!(cfg.prefix, "p");
        assert_eq!(cfg.scan_caching, 16);
        assert_eq!(cfg.id_length, DEFAULT_ID_LENGTH);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            GraphConfig::from_json_str(r#"{"prefix": ""}"#),
            Err(GraphStoreError::InvalidInput(_))
        ));
        assert!(matches!(
            GraphConfig::from_json_str(r#"{"prefix": "p", "id_length": 0}"#),
            Err(GraphStoreError::InvalidInput(_))
        ));
        assert!(matches!(
            GraphConfig::from_json_str("not json"),
            Err(GraphStoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let cfg = GraphConfig::memory("filecfg");
        std::fs::write(&path, serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(GraphConfig::from_json_file(&path).unwrap(), cfg);
        assert!(GraphConfig::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
