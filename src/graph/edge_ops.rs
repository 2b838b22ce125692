//! Edge CRUD operations for GraphStore.

use tracing::debug;

use super::{EdgeIds, GraphStore, scan::RowScan};
use crate::errors::Result;
use crate::keys::{self, to_string_binary};
use crate::schema::{EDG_CF, EDG_IN_Q, EDG_IS_Q, EDG_OUT_Q, TRUE, VTX_IN_CF, VTX_OUT_CF};
use crate::store::{Cell, Column, ScanSpec, Selector, StoreBackend, TableHandle};

impl<B: StoreBackend> GraphStore<B> {
    /// Writes the edge row, then both adjacency records. Endpoints are not
    /// checked for existence.
    pub fn add_edge(&self, id: Option<&[u8]>, out_vertex: &[u8], in_vertex: &[u8]) -> Result<Vec<u8>> {
        let id = self.resolve_id(id);
        self.table(&self.schema.edge_table)?.put(
            &id,
            &[
                Cell::new(EDG_CF, EDG_IS_Q, TRUE),
                Cell::new(EDG_CF, EDG_OUT_Q, out_vertex),
                Cell::new(EDG_CF, EDG_IN_Q, in_vertex),
            ],
        )?;
        let vertices = self.table(&self.schema.vertex_table)?;
        vertices.put(
            &keys::concat(out_vertex, &id),
            &[Cell::new(VTX_OUT_CF, out_vertex, in_vertex)],
        )?;
        vertices.put(
            &keys::concat(in_vertex, &id),
            &[Cell::new(VTX_IN_CF, in_vertex, out_vertex)],
        )?;
        Ok(id)
    }

    pub fn edge_exists(&self, id: &[u8]) -> Result<bool> {
        let row = self
            .table(&self.schema.edge_table)?
            .get(id, &Selector::column(EDG_CF, EDG_IS_Q))?;
        Ok(!row.is_empty())
    }

    pub fn all_edges(&self) -> Result<EdgeIds<'_, B>> {
        let spec = ScanSpec::full(EDG_CF, self.scan_caching());
        Ok(EdgeIds {
            scan: RowScan::open(self, &self.schema.edge_table, spec)?,
        })
    }

    pub fn get_out_vertex(&self, id: &[u8]) -> Result<Option<Vec<u8>>> {
        self.edge_endpoint(id, EDG_OUT_Q)
    }

    pub fn get_in_vertex(&self, id: &[u8]) -> Result<Option<Vec<u8>>> {
        self.edge_endpoint(id, EDG_IN_Q)
    }

    fn edge_endpoint(&self, id: &[u8], qualifier: &[u8]) -> Result<Option<Vec<u8>>> {
        let row = self
            .table(&self.schema.edge_table)?
            .get(id, &Selector::column(EDG_CF, qualifier))?;
        Ok(row.value(EDG_CF, qualifier).map(<[u8]>::to_vec))
    }

    /// Reads both endpoints from the edge row and removes the edge. When the
    /// row is gone or incomplete, leftover properties are still removed but
    /// adjacency records cannot be located and are left alone.
    pub fn remove_edge(&self, id: &[u8]) -> Result<()> {
        let row = self
            .table(&self.schema.edge_table)?
            .get(id, &Selector::Family(EDG_CF))?;
        match (row.value(EDG_CF, EDG_OUT_Q), row.value(EDG_CF, EDG_IN_Q)) {
            (Some(out_vertex), Some(in_vertex)) => self.remove_edge_with(id, out_vertex, in_vertex),
            _ => {
                debug!(edge = %to_string_binary(id), "edge row incomplete, skipping adjacency");
                self.edge_properties().remove_all(id)?;
                self.table(&self.schema.edge_table)?.delete_row(id)
            }
        }
    }

    /// Removes properties, then the edge row, then both adjacency cells.
    pub fn remove_edge_with(&self, id: &[u8], out_vertex: &[u8], in_vertex: &[u8]) -> Result<()> {
        self.edge_properties().remove_all(id)?;
        self.table(&self.schema.edge_table)?.delete_row(id)?;
        let vertices = self.table(&self.schema.vertex_table)?;
        vertices.delete_columns(
            &keys::concat(out_vertex, id),
            &[Column::new(VTX_OUT_CF, out_vertex)],
        )?;
        vertices.delete_columns(
            &keys::concat(in_vertex, id),
            &[Column::new(VTX_IN_CF, in_vertex)],
        )
    }
}
