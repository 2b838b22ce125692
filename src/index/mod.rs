//! Secondary indexes on property payloads.
//!
//! Each indexed key owns one table, `<prefix>_idx_<escaped key>`, with a
//! column family per element kind. An entry for element `id` carrying payload
//! `p` is the row `p ++ id`, qualifier `p`, value `id`. Entries ignore the
//! type discriminator, so an indexed key should only ever hold one type.

mod lookup;
mod registry;

use std::collections::BTreeSet;

use tracing::info;

pub use lookup::{IndexHit, IndexHits, IndexRangeHits};
pub use registry::IndexRegistry;

use crate::errors::{GraphStoreError, Result};
use crate::graph::GraphStore;
use crate::keys::{self, to_string_binary};
use crate::schema::ElementKind;
use crate::store::{Cell, Column, StoreBackend, TableHandle};

impl<B: StoreBackend> GraphStore<B> {
    /// Creates the index table for `key` and registers it. Existing values are
    /// not indexed until [`GraphStore::reindex_vertices`] /
    /// [`GraphStore::reindex_edges`] run. Fails with `TableExists` if the
    /// table is already present.
    pub fn create_index(&self, key: &[u8]) -> Result<()> {
        let table = self.schema().create_index_table(self.backend(), key)?;
        info!(key = %to_string_binary(key), table = %table, "created index");
        self.registry().insert(key, &table);
        Ok(())
    }

    /// Deletes the index table for `key` and unregisters it.
    pub fn drop_index(&self, key: &[u8]) -> Result<()> {
        let table = self
            .registry()
            .get(key)
            .ok_or_else(|| GraphStoreError::index_not_found(key))?;
        self.backend().delete_table(&table)?;
        self.pool().evict(&table);
        self.registry().remove(key);
        info!(key = %to_string_binary(key), table = %table, "dropped index");
        Ok(())
    }

    /// Rewrites the index entry of every vertex carrying `key`. Returns how
    /// many vertices were indexed.
    pub fn reindex_vertices(&self, key: &[u8]) -> Result<usize> {
        self.reindex_kind(ElementKind::Vertex, key)
    }

    /// Edge counterpart of [`GraphStore::reindex_vertices`].
    pub fn reindex_edges(&self, key: &[u8]) -> Result<usize> {
        self.reindex_kind(ElementKind::Edge, key)
    }

    pub(crate) fn reindex_kind(&self, kind: ElementKind, key: &[u8]) -> Result<usize> {
        if !self.registry().contains(key) {
            return Err(GraphStoreError::index_not_found(key));
        }
        let indexed = match kind {
            ElementKind::Vertex => self.reindex_ids(kind, key, self.all_vertices()?)?,
            ElementKind::Edge => self.reindex_ids(kind, key, self.all_edges()?)?,
        };
        info!(
            key = %to_string_binary(key),
            kind = kind.as_str(),
            indexed,
            "reindexed"
        );
        Ok(indexed)
    }

    fn reindex_ids(
        &self,
        kind: ElementKind,
        key: &[u8],
        ids: impl Iterator<Item = Result<Vec<u8>>>,
    ) -> Result<usize> {
        let properties = self.properties(kind);
        let mut indexed = 0;
        for id in ids {
            let id = id?;
            if let Some(value) = properties.get_typed(&id, key)? {
                properties.set_typed(&id, key, &value)?;
                indexed += 1;
            }
        }
        Ok(indexed)
    }

    /// Keys with a registered index.
    pub fn index_keys(&self) -> BTreeSet<Vec<u8>> {
        self.registry().keys()
    }

    pub(crate) fn write_index_entry(
        &self,
        table: &str,
        kind: ElementKind,
        payload: &[u8],
        id: &[u8],
    ) -> Result<()> {
        self.table(table)?.put(
            &keys::concat(payload, id),
            &[Cell::new(kind.index_family(), payload, id)],
        )
    }

    pub(crate) fn delete_index_entry(
        &self,
        table: &str,
        kind: ElementKind,
        payload: &[u8],
        id: &[u8],
    ) -> Result<()> {
        self.table(table)?.delete_columns(
            &keys::concat(payload, id),
            &[Column::new(kind.index_family(), payload)],
        )
    }
}
