//! Lazy scan-backed sequences.
//!
//! A [`RowScan`] takes a pooled handle when it is created and gives it back
//! exactly once: when the scan is exhausted, when it fails, on [`RowScan::close`],
//! or when it is dropped.

use tracing::trace;

use super::GraphStore;
use crate::errors::Result;
use crate::store::{PooledTable, Row, RowScanner, ScanSpec, StoreBackend, TableHandle};

pub struct RowScan<'g, B: StoreBackend> {
    state: Option<(PooledTable<'g, B>, Box<dyn RowScanner>)>,
}

impl<'g, B: StoreBackend> RowScan<'g, B> {
    pub(crate) fn open(graph: &'g GraphStore<B>, table: &str, spec: ScanSpec) -> Result<Self> {
        let handle = graph.table(table)?;
        trace!(table, family = spec.family, caching = spec.caching, "opening scan");
        let scanner = handle.scan(spec)?;
        Ok(Self {
            state: Some((handle, scanner)),
        })
    }

    /// Releases the scan early. Later calls to `next` return `None`.
    pub fn close(&mut self) {
        self.state = None;
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }
}

impl<B: StoreBackend> Iterator for RowScan<'_, B> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, scanner) = self.state.as_mut()?;
        let item = scanner.next();
        if !matches!(item, Some(Ok(_))) {
            self.close();
        }
        item
    }
}

/// Ids of every vertex, ascending.
pub struct VertexIds<'g, B: StoreBackend> {
    pub(crate) scan: RowScan<'g, B>,
}

/// Ids of every edge, ascending.
pub struct EdgeIds<'g, B: StoreBackend> {
    pub(crate) scan: RowScan<'g, B>,
}

macro_rules! id_sequence {
    ($name:ident) => {
        impl<B: StoreBackend> $name<'_, B> {
            pub fn close(&mut self) {
                self.scan.close();
            }
        }

        impl<B: StoreBackend> Iterator for $name<'_, B> {
            type Item = Result<Vec<u8>>;

            fn next(&mut self) -> Option<Self::Item> {
                self.scan.next().map(|row| row.map(|row| row.key))
            }
        }
    };
}

id_sequence!(VertexIds);
id_sequence!(EdgeIds);
