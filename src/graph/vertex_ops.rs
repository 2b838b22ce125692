//! Vertex CRUD operations for GraphStore.

use super::{GraphStore, VertexIds, cascade, scan::RowScan};
use crate::errors::Result;
use crate::schema::{TRUE, VTX_CF, VTX_IS_Q};
use crate::store::{Cell, ScanSpec, Selector, StoreBackend, TableHandle};

impl<B: StoreBackend> GraphStore<B> {
    /// Writes the existence marker, generating an id when none is given.
    /// Re-adding an existing id rewrites the marker.
    pub fn add_vertex(&self, id: Option<&[u8]>) -> Result<Vec<u8>> {
        let id = self.resolve_id(id);
        self.table(&self.schema.vertex_table)?
            .put(&id, &[Cell::new(VTX_CF, VTX_IS_Q, TRUE)])?;
        Ok(id)
    }

    pub fn vertex_exists(&self, id: &[u8]) -> Result<bool> {
        let row = self
            .table(&self.schema.vertex_table)?
            .get(id, &Selector::column(VTX_CF, VTX_IS_Q))?;
        Ok(!row.is_empty())
    }

    pub fn all_vertices(&self) -> Result<VertexIds<'_, B>> {
        let spec = ScanSpec::full(VTX_CF, self.scan_caching());
        Ok(VertexIds {
            scan: RowScan::open(self, &self.schema.vertex_table, spec)?,
        })
    }

    /// Removes every incident edge, then the vertex's properties, then its marker.
    pub fn remove_vertex(&self, id: &[u8]) -> Result<()> {
        let steps = cascade::plan_vertex_removal(self, id)?;
        cascade::run(self, &steps)
    }
}
