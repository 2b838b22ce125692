//! Property storage shared by vertices and edges.
//!
//! A property `k` is two cells in the element's properties row: `k` holds the
//! payload and `k_type` the one-byte discriminator. Both are written and
//! deleted together. When `k` is indexed, every write and removal also
//! maintains the index entry `payload ++ id`.

use super::GraphStore;
use crate::codec::{TaggedSerializer, TypedValue, Value, ValueSerializer};
use crate::errors::{GraphStoreError, Result};
use crate::keys;
use crate::schema::{ElementKind, TYPE_SUFFIX};
use crate::store::{Cell, Column, Selector, StoreBackend, TableHandle};

fn type_qualifier(key: &[u8]) -> Vec<u8> {
    keys::concat(key, TYPE_SUFFIX)
}

/// Property operations for one element kind.
pub struct PropertyStore<'g, B: StoreBackend> {
    graph: &'g GraphStore<B>,
    kind: ElementKind,
}

impl<'g, B: StoreBackend> PropertyStore<'g, B> {
    pub(crate) fn new(graph: &'g GraphStore<B>, kind: ElementKind) -> Self {
        Self { graph, kind }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    fn table_name(&self) -> &'g str {
        self.kind.properties_table(&self.graph.schema)
    }

    fn family(&self) -> &'static str {
        self.kind.properties_family()
    }

    /// Stores a serialized value (`tag ++ payload`).
    pub fn set(&self, id: &[u8], key: &[u8], serialized: &[u8]) -> Result<()> {
        self.set_typed(id, key, &TypedValue::split(serialized)?)
    }

    /// Removes any prior value, writes payload and type cells, then the index
    /// entry when `key` is indexed.
    pub fn set_typed(&self, id: &[u8], key: &[u8], value: &TypedValue) -> Result<()> {
        self.remove(id, key)?;
        let family = self.family();
        self.graph.table(self.table_name())?.put(
            id,
            &[
                Cell::new(family, key, value.payload.as_slice()),
                Cell::new(family, type_qualifier(key), [value.type_tag]),
            ],
        )?;
        if let Some(index_table) = self.graph.registry().get(key) {
            self.graph
                .write_index_entry(&index_table, self.kind, &value.payload, id)?;
        }
        Ok(())
    }

    pub fn set_value(&self, id: &[u8], key: &[u8], value: &Value) -> Result<()> {
        self.set(id, key, &TaggedSerializer.serialize(value)?)
    }

    /// The serialized value, or `None` unless both cells are present.
    pub fn get(&self, id: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.get_typed(id, key)?.map(|typed| typed.join()))
    }

    pub fn get_typed(&self, id: &[u8], key: &[u8]) -> Result<Option<TypedValue>> {
        let family = self.family();
        let type_q = type_qualifier(key);
        let row = self.graph.table(self.table_name())?.get(
            id,
            &Selector::Columns(vec![
                Column::new(family, key),
                Column::new(family, type_q.clone()),
            ]),
        )?;
        let (Some(payload), Some(tag)) = (row.value(family, key), row.value(family, &type_q)) else {
            return Ok(None);
        };
        match tag {
            [tag] => Ok(Some(TypedValue::new(*tag, payload))),
            _ => Err(GraphStoreError::invalid_input(format!(
                "type cell of property {} holds {} bytes",
                keys::to_string_binary(key),
                tag.len()
            ))),
        }
    }

    pub fn get_value(&self, id: &[u8], key: &[u8]) -> Result<Option<Value>> {
        self.get(id, key)?
            .map(|bytes| TaggedSerializer.deserialize(&bytes))
            .transpose()
    }

    /// Deletes both cells and, when indexed, the entry for the current payload.
    pub fn remove(&self, id: &[u8], key: &[u8]) -> Result<()> {
        let prior = if self.graph.registry().contains(key) {
            let row = self
                .graph
                .table(self.table_name())?
                .get(id, &Selector::column(self.family(), key))?;
            row.value(self.family(), key).map(<[u8]>::to_vec)
        } else {
            None
        };
        self.remove_known(id, key, prior.as_deref())
    }

    /// Removal when the current payload is already known, skipping the read.
    pub(crate) fn remove_known(&self, id: &[u8], key: &[u8], payload: Option<&[u8]>) -> Result<()> {
        let family = self.family();
        self.graph.table(self.table_name())?.delete_columns(
            id,
            &[Column::new(family, key), Column::new(family, type_qualifier(key))],
        )?;
        if let (Some(payload), Some(index_table)) = (payload, self.graph.registry().get(key)) {
            self.graph
                .delete_index_entry(&index_table, self.kind, payload, id)?;
        }
        Ok(())
    }

    /// Removes every property (with index cleanup), then the row.
    pub fn remove_all(&self, id: &[u8]) -> Result<()> {
        for (key, payload) in self.list(id)? {
            self.remove_known(id, &key, Some(&payload))?;
        }
        self.graph.table(self.table_name())?.delete_row(id)
    }

    /// All `(key, payload)` pairs from one row read. A cell counts as a
    /// property only when its `_type` companion is present.
    pub fn list(&self, id: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let family = self.family();
        let row = self
            .graph
            .table(self.table_name())?
            .get(id, &Selector::Family(family))?;
        let Some(cells) = row.family(family) else {
            return Ok(Vec::new());
        };
        Ok(cells
            .iter()
            .filter(|(q, _)| cells.contains_key(&type_qualifier(q)))
            .map(|(q, v)| (q.clone(), v.clone()))
            .collect())
    }

    /// Keys of every property on the element.
    pub fn keys(&self, id: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self.list(id)?.into_iter().map(|(key, _)| key).collect())
    }
}
