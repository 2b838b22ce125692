//! Graph storage engine over a sorted column store.
//!
//! Vertices, edges, adjacency records and properties are plain rows; see
//! [`crate::schema`] for the layout. No operation is atomic across rows.
//! Cascades run as ordered lists of idempotent steps, so re-running one that
//! failed halfway converges on the same end state.

mod adjacency;
mod cascade;
mod edge_ops;
mod property;
mod scan;
mod vertex_ops;

use std::fmt;

use rand::RngCore;
use tracing::{debug, trace, warn};

pub use adjacency::{AdjacentEdges, Direction, EdgeRecord};
pub use cascade::CascadeStep;
pub use property::PropertyStore;
pub use scan::{EdgeIds, RowScan, VertexIds};

use crate::config::GraphConfig;
use crate::errors::Result;
use crate::index::IndexRegistry;
use crate::schema::{ElementKind, Schema};
use crate::store::{PooledTable, StoreBackend, TablePool};

/// One graph instance: a prefix, its tables, and the index registry.
pub struct GraphStore<B: StoreBackend> {
    backend: B,
    schema: Schema,
    pool: TablePool<B>,
    indexes: IndexRegistry,
    id_length: usize,
    scan_caching: usize,
}

impl<B: StoreBackend> GraphStore<B> {
    /// Opens the instance described by `config` on `backend`, creating the
    /// base tables when `config.create_tables` is set and loading the index
    /// registry from the store.
    pub fn open(backend: B, config: &GraphConfig) -> Result<Self> {
        config.validate()?;
        let graph = Self {
            backend,
            schema: Schema::new(&config.prefix),
            pool: TablePool::new(),
            indexes: IndexRegistry::new(),
            id_length: config.id_length,
            scan_caching: config.scan_caching,
        };
        if config.create_tables {
            graph.create_tables()?;
        }
        graph.reload_indexes()?;
        Ok(graph)
    }

    /// Opens with default settings under `prefix`.
    pub fn with_prefix(backend: B, prefix: &str) -> Result<Self> {
        Self::open(backend, &GraphConfig::new(prefix))
    }

    /// The escaped instance prefix.
    pub fn prefix(&self) -> &str {
        self.schema.prefix()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates any missing base tables.
    pub fn create_tables(&self) -> Result<()> {
        self.schema.create_tables(&self.backend)
    }

    /// Drops base and index tables and clears the registry.
    pub fn drop_tables(&self) -> Result<()> {
        self.schema.drop_tables(&self.backend)?;
        for table in self.indexes.tables() {
            self.pool.evict(&table);
        }
        for table in [
            &self.schema.vertex_table,
            &self.schema.vertex_properties_table,
            &self.schema.edge_table,
            &self.schema.edge_properties_table,
        ] {
            self.pool.evict(table);
        }
        self.indexes.clear();
        Ok(())
    }

    /// Rebuilds the index registry from the store's table list.
    pub fn reload_indexes(&self) -> Result<()> {
        let mut found = Vec::new();
        for table in self.backend.list_tables()? {
            match self.schema.index_key(&table) {
                Some(Ok(key)) => {
                    trace!(table = %table, "found index table");
                    found.push((key, table));
                }
                Some(Err(err)) => warn!(table = %table, error = %err, "skipping index table"),
                None => {}
            }
        }
        debug!(prefix = %self.prefix(), count = found.len(), "reloaded index registry");
        self.indexes.replace(found);
        Ok(())
    }

    /// Property access for vertices.
    pub fn vertex_properties(&self) -> PropertyStore<'_, B> {
        PropertyStore::new(self, ElementKind::Vertex)
    }

    /// Property access for edges.
    pub fn edge_properties(&self) -> PropertyStore<'_, B> {
        PropertyStore::new(self, ElementKind::Edge)
    }

    pub fn properties(&self, kind: ElementKind) -> PropertyStore<'_, B> {
        PropertyStore::new(self, kind)
    }

    pub(crate) fn table(&self, name: &str) -> Result<PooledTable<'_, B>> {
        self.pool.borrow(&self.backend, name)
    }

    pub(crate) fn pool(&self) -> &TablePool<B> {
        &self.pool
    }

    pub(crate) fn registry(&self) -> &IndexRegistry {
        &self.indexes
    }

    pub(crate) fn scan_caching(&self) -> usize {
        self.scan_caching
    }

    pub(crate) fn resolve_id(&self, id: Option<&[u8]>) -> Vec<u8> {
        match id {
            Some(id) => id.to_vec(),
            None => {
                let mut id = vec![0u8; self.id_length];
                rand::thread_rng().fill_bytes(&mut id);
                id
            }
        }
    }
}

impl<B: StoreBackend> fmt::Display for GraphStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphStore[{}]", self.prefix())
    }
}

impl<B: StoreBackend> fmt::Debug for GraphStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("prefix", &self.prefix())
            .field("indexes", &self.indexes.len())
            .field("id_length", &self.id_length)
            .field("scan_caching", &self.scan_caching)
            .finish()
    }
}
