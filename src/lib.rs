//! Graph storage over a sorted, column-oriented key-value store.
//!
//! tablegraph stores vertices, edges, adjacency records, properties and
//! secondary-index entries as rows in a small set of tables per graph
//! instance, and layers traversal and index lookups on top of ordered range
//! scans. The store needs no cross-row transactions: multi-row mutations run
//! as ordered sequences of idempotent steps.
//!
//! # Quick Start
//!
//! ```rust
//! use tablegraph::{GraphConfig, Value, open_graph};
//!
//! let graph = open_graph(&GraphConfig::memory("social"))?;
//! let alice = graph.add_vertex(Some(b"alice"))?;
//! let bob = graph.add_vertex(Some(b"bob"))?;
//! let knows = graph.add_edge(None, &alice, &bob)?;
//!
//! graph.create_index(b"city")?;
//! graph.vertex_properties().set_value(&alice, b"city", &Value::from("Oslo"))?;
//!
//! let out: Vec<_> = graph.edges_out(&alice)?.collect::<Result<_, _>>()?;
//! assert_eq!(out[0].edge_id, knows);
//! let hits: Vec<_> = graph.vertex_lookup(b"city", b"Oslo")?.collect::<Result<_, _>>()?;
//! assert_eq!(hits[0].element_id, alice);
//! # Ok::<(), tablegraph::GraphStoreError>(())
//! ```
//!
//! # Public API Organization
//!
//! ## Core Types
//! - [`GraphStore`] - One graph instance over a [`StoreBackend`]
//! - [`PropertyStore`] - Property access for one [`ElementKind`]
//! - [`EdgeRecord`], [`IndexHit`] - Items of adjacency and index sequences
//!
//! ## Configuration
//! - [`GraphConfig`], [`BackendKind`], [`SqliteConfig`]
//! - [`open_graph()`] - Opens a graph over the configured substrate
//!
//! ## Substrates
//! - [`MemoryStore`] - In-process sorted tables with fault injection
//! - [`SqliteStore`] - SQLite tables (feature `sqlite-backend`)
//!
//! ## Utilities
//! - [`keys`] - Identifier escaping and prefix-scan bounds
//! - [`codec`] - Discriminator/payload split and the bundled serializer
//! - [`reindex`] - Bulk rebuild and repair of indexes

pub mod codec;
pub mod config;
pub mod errors;
pub mod graph;
pub mod index;
pub mod keys;
pub mod reindex;
pub mod schema;
pub mod store;

pub use crate::codec::{TaggedSerializer, TypedValue, Value, ValueSerializer};
pub use crate::config::{AnyGraph, BackendKind, GraphConfig, SqliteConfig, open_graph};
pub use crate::errors::{GraphStoreError, Result};
pub use crate::graph::{
    AdjacentEdges, CascadeStep, Direction, EdgeIds, EdgeRecord, GraphStore, PropertyStore, RowScan,
    VertexIds,
};
pub use crate::index::{IndexHit, IndexHits, IndexRangeHits, IndexRegistry};
pub use crate::reindex::{
    GraphReindexer, ReindexConfig, ReindexProgress, ReindexResult, ReindexStage, RepairResult,
};
pub use crate::schema::{ElementKind, Schema};
#[cfg(feature = "sqlite-backend")]
pub use crate::store::SqliteStore;
pub use crate::store::{AnyStore, FaultPoint, MemoryStore, StoreBackend, TableHandle};
