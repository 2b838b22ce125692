//! Adjacency traversal for GraphStore.
//!
//! An edge `e` from `a` to `b` is projected into the vertex table twice: row
//! `a ++ e` in family `out` (qualifier `a`, value `b`) and row `b ++ e` in
//! family `in` (qualifier `b`, value `a`). Traversal is a prefix scan over the
//! vertex id.

use super::{GraphStore, scan::RowScan};
use crate::errors::Result;
use crate::keys;
use crate::schema::{VTX_IN_CF, VTX_OUT_CF};
use crate::store::{ScanSpec, StoreBackend};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

impl Direction {
    fn family(self) -> &'static str {
        match self {
            Direction::Out => VTX_OUT_CF,
            Direction::In => VTX_IN_CF,
        }
    }
}

/// `(out vertex, edge id, in vertex)` as seen from one endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeRecord {
    pub out_vertex: Vec<u8>,
    pub edge_id: Vec<u8>,
    pub in_vertex: Vec<u8>,
}

pub struct AdjacentEdges<'g, B: StoreBackend> {
    scan: RowScan<'g, B>,
    vertex: Vec<u8>,
    direction: Direction,
}

impl<B: StoreBackend> AdjacentEdges<'_, B> {
    pub fn close(&mut self) {
        self.scan.close();
    }
}

impl<B: StoreBackend> Iterator for AdjacentEdges<'_, B> {
    type Item = Result<EdgeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.scan.next()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err)),
            };
            // Rows of a longer vertex id sharing this prefix carry a different qualifier.
            let Some(other) = row
                .value(self.direction.family(), &self.vertex)
                .filter(|v| !v.is_empty())
            else {
                continue;
            };
            let Some(edge_id) = row.key.get(self.vertex.len()..) else {
                continue;
            };
            let record = match self.direction {
                Direction::Out => EdgeRecord {
                    out_vertex: self.vertex.clone(),
                    edge_id: edge_id.to_vec(),
                    in_vertex: other.to_vec(),
                },
                Direction::In => EdgeRecord {
                    out_vertex: other.to_vec(),
                    edge_id: edge_id.to_vec(),
                    in_vertex: self.vertex.clone(),
                },
            };
            return Some(Ok(record));
        }
    }
}

impl<B: StoreBackend> GraphStore<B> {
    pub fn edges_out(&self, vertex: &[u8]) -> Result<AdjacentEdges<'_, B>> {
        self.edges(vertex, Direction::Out)
    }

    pub fn edges_in(&self, vertex: &[u8]) -> Result<AdjacentEdges<'_, B>> {
        self.edges(vertex, Direction::In)
    }

    /// Scans `[vertex, end_key(vertex))` in the direction's family.
    pub fn edges(&self, vertex: &[u8], direction: Direction) -> Result<AdjacentEdges<'_, B>> {
        let spec = ScanSpec::range(
            vertex.to_vec(),
            keys::end_key(vertex),
            direction.family(),
            self.scan_caching(),
        );
        Ok(AdjacentEdges {
            scan: RowScan::open(self, &self.schema.vertex_table, spec)?,
            vertex: vertex.to_vec(),
            direction,
        })
    }
}
