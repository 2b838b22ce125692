//! Ordered removal plans.
//!
//! Every step is idempotent: deleting something already gone is a no-op, so a
//! plan that failed partway can be planned and run again.

use ahash::AHashSet;
use tracing::debug;

use super::GraphStore;
use crate::errors::Result;
use crate::keys::to_string_binary;
use crate::schema::ElementKind;
use crate::store::{StoreBackend, TableHandle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeStep {
    RemoveEdge {
        edge_id: Vec<u8>,
        out_vertex: Vec<u8>,
        in_vertex: Vec<u8>,
    },
    RemoveProperties {
        kind: ElementKind,
        id: Vec<u8>,
    },
    DeleteVertexMarker {
        id: Vec<u8>,
    },
}

/// Incident edges first (outgoing, then incoming), then properties, then the marker.
/// A self-loop shows up in both directions but is planned once.
pub(crate) fn plan_vertex_removal<B: StoreBackend>(
    graph: &GraphStore<B>,
    id: &[u8],
) -> Result<Vec<CascadeStep>> {
    let mut steps = Vec::new();
    let mut seen = AHashSet::new();
    for record in graph.edges_out(id)?.chain(graph.edges_in(id)?) {
        let record = record?;
        if seen.insert(record.edge_id.clone()) {
            steps.push(CascadeStep::RemoveEdge {
                edge_id: record.edge_id,
                out_vertex: record.out_vertex,
                in_vertex: record.in_vertex,
            });
        }
    }
    steps.push(CascadeStep::RemoveProperties {
        kind: ElementKind::Vertex,
        id: id.to_vec(),
    });
    steps.push(CascadeStep::DeleteVertexMarker { id: id.to_vec() });
    Ok(steps)
}

pub(crate) fn run<B: StoreBackend>(graph: &GraphStore<B>, steps: &[CascadeStep]) -> Result<()> {
    for step in steps {
        match step {
            CascadeStep::RemoveEdge {
                edge_id,
                out_vertex,
                in_vertex,
            } => {
                debug!(edge = %to_string_binary(edge_id), "cascade: removing edge");
                graph.remove_edge_with(edge_id, out_vertex, in_vertex)?;
            }
            CascadeStep::RemoveProperties { kind, id } => {
                debug!(kind = kind.as_str(), id = %to_string_binary(id), "cascade: removing properties");
                graph.properties(*kind).remove_all(id)?;
            }
            CascadeStep::DeleteVertexMarker { id } => {
                debug!(vertex = %to_string_binary(id), "cascade: deleting vertex marker");
                graph.table(&graph.schema.vertex_table)?.delete_row(id)?;
            }
        }
    }
    Ok(())
}
