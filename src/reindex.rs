//! Bulk index maintenance.
//!
//! [`GraphReindexer`] rebuilds the entries of every registered index for both
//! element kinds. [`GraphStore::repair_index`] is the recovery path for index
//! drift left behind by an interrupted cascade: it deletes entries whose
//! element no longer carries the indexed payload, then reindexes.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::errors::{GraphStoreError, Result};
use crate::graph::{GraphStore, RowScan};
use crate::keys::to_string_binary;
use crate::schema::ElementKind;
use crate::store::{Column, ScanSpec, StoreBackend, TableHandle};

/// Reindexing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexStage {
    Vertices,
    Edges,
    Complete,
}

/// Reindexing progress information
#[derive(Debug, Clone)]
pub struct ReindexProgress {
    pub stage: ReindexStage,
    /// Key being rebuilt; empty once complete.
    pub key: Vec<u8>,
    /// Keys finished so far.
    pub current: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl ReindexProgress {
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}

/// Reindexing configuration
pub struct ReindexConfig {
    /// Whether to rebuild vertex entries
    pub vertices: bool,
    /// Whether to rebuild edge entries
    pub edges: bool,
    /// Called before each key of each stage and once on completion.
    pub progress_callback: Option<Box<dyn Fn(ReindexProgress) + Send + Sync>>,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            vertices: true,
            edges: true,
            progress_callback: None,
        }
    }
}

impl ReindexConfig {
    pub fn with_progress(mut self, callback: impl Fn(ReindexProgress) + Send + Sync + 'static) -> Self {
        self.progress_callback = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for ReindexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReindexConfig")
            .field("vertices", &self.vertices)
            .field("edges", &self.edges)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// Reindexing results
#[derive(Debug, Clone, Default)]
pub struct ReindexResult {
    pub total_duration: Duration,
    pub keys: Vec<Vec<u8>>,
    pub vertices_indexed: usize,
    pub edges_indexed: usize,
}

/// Outcome of [`GraphStore::repair_index`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairResult {
    pub stale_removed: usize,
    pub vertices_indexed: usize,
    pub edges_indexed: usize,
}

pub struct GraphReindexer<'a, B: StoreBackend> {
    graph: &'a GraphStore<B>,
    config: ReindexConfig,
}

impl<'a, B: StoreBackend> GraphReindexer<'a, B> {
    pub fn new(graph: &'a GraphStore<B>, config: ReindexConfig) -> Self {
        Self { graph, config }
    }

    /// Rebuilds every registered index according to the configuration.
    pub fn reindex(&self) -> Result<ReindexResult> {
        let start_time = Instant::now();
        let keys: Vec<Vec<u8>> = self.graph.index_keys().into_iter().collect();
        info!(graph = %self.graph, keys = keys.len(), "reindex started");
        let mut result = ReindexResult::default();

        if self.config.vertices {
            result.vertices_indexed =
                self.reindex_stage(ReindexStage::Vertices, ElementKind::Vertex, &keys, start_time)?;
        }
        if self.config.edges {
            result.edges_indexed =
                self.reindex_stage(ReindexStage::Edges, ElementKind::Edge, &keys, start_time)?;
        }

        self.report_progress(ReindexStage::Complete, &[], keys.len(), keys.len(), start_time);
        result.total_duration = start_time.elapsed();
        result.keys = keys;
        info!(
            graph = %self.graph,
            vertices = result.vertices_indexed,
            edges = result.edges_indexed,
            elapsed_ms = result.total_duration.as_millis() as u64,
            "reindex finished"
        );
        Ok(result)
    }

    fn reindex_stage(
        &self,
        stage: ReindexStage,
        kind: ElementKind,
        keys: &[Vec<u8>],
        start_time: Instant,
    ) -> Result<usize> {
        let mut indexed = 0;
        for (done, key) in keys.iter().enumerate() {
            self.report_progress(stage, key, done, keys.len(), start_time);
            indexed += self.graph.reindex_kind(kind, key)?;
        }
        Ok(indexed)
    }

    fn report_progress(&self, stage: ReindexStage, key: &[u8], current: usize, total: usize, start_time: Instant) {
        if let Some(callback) = &self.config.progress_callback {
            callback(ReindexProgress {
                stage,
                key: key.to_vec(),
                current,
                total,
                elapsed: start_time.elapsed(),
            });
        }
    }
}

impl<B: StoreBackend> GraphStore<B> {
    /// Rebuilds every registered index for vertices and edges.
    pub fn reindex_all(&self) -> Result<ReindexResult> {
        GraphReindexer::new(self, ReindexConfig::default()).reindex()
    }

    /// Deletes stale entries from the index on `key`, then reindexes both kinds.
    ///
    /// An entry is stale when its element no longer carries `key` or carries a
    /// different payload. Dangling adjacency or property rows are not touched.
    pub fn repair_index(&self, key: &[u8]) -> Result<RepairResult> {
        let table = self
            .registry()
            .get(key)
            .ok_or_else(|| GraphStoreError::index_not_found(key))?;
        let mut result = RepairResult::default();
        for kind in [ElementKind::Vertex, ElementKind::Edge] {
            result.stale_removed += self.remove_stale_entries(&table, kind, key)?;
        }
        result.vertices_indexed = self.reindex_vertices(key)?;
        result.edges_indexed = self.reindex_edges(key)?;
        info!(
            key = %to_string_binary(key),
            stale = result.stale_removed,
            "repaired index"
        );
        Ok(result)
    }

    fn remove_stale_entries(&self, table: &str, kind: ElementKind, key: &[u8]) -> Result<usize> {
        let family = kind.index_family();
        let properties = self.properties(kind);
        let spec = ScanSpec::full(family, self.scan_caching());
        let mut removed = 0;
        for row in RowScan::open(self, table, spec)? {
            let row = row?;
            let Some(cells) = row.family(family) else {
                continue;
            };
            for (payload, element_id) in cells {
                let current = properties.get_typed(element_id, key)?;
                if current.is_some_and(|v| v.payload == *payload) {
                    continue;
                }
                debug!(
                    key = %to_string_binary(key),
                    element = %to_string_binary(element_id),
                    "removing stale index entry"
                );
                self.table(table)?
                    .delete_columns(&row.key, &[Column::new(family, payload.clone())])?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
