//! Point and range lookups over index tables.

use std::collections::VecDeque;

use crate::errors::{GraphStoreError, Result};
use crate::graph::{GraphStore, RowScan};
use crate::keys;
use crate::schema::ElementKind;
use crate::store::{ScanSpec, StoreBackend};

/// One index entry: the indexed key, the payload and the element carrying it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexHit {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub element_id: Vec<u8>,
}

/// Entries whose payload equals the looked-up value exactly.
pub struct IndexHits<'g, B: StoreBackend> {
    scan: RowScan<'g, B>,
    family: &'static str,
    key: Vec<u8>,
    value: Vec<u8>,
}

impl<B: StoreBackend> IndexHits<'_, B> {
    pub fn close(&mut self) {
        self.scan.close();
    }
}

impl<B: StoreBackend> Iterator for IndexHits<'_, B> {
    type Item = Result<IndexHit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.scan.next()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err)),
            };
            // Longer payloads sharing this prefix land in the scan too.
            if let Some(element_id) = row.value(self.family, &self.value) {
                return Some(Ok(IndexHit {
                    key: self.key.clone(),
                    value: self.value.clone(),
                    element_id: element_id.to_vec(),
                }));
            }
        }
    }
}

/// Entries with `start <= payload < stop`, in row order.
pub struct IndexRangeHits<'g, B: StoreBackend> {
    scan: RowScan<'g, B>,
    family: &'static str,
    key: Vec<u8>,
    start: Vec<u8>,
    stop: Vec<u8>,
    pending: VecDeque<IndexHit>,
}

impl<B: StoreBackend> IndexRangeHits<'_, B> {
    pub fn close(&mut self) {
        self.pending.clear();
        self.scan.close();
    }
}

impl<B: StoreBackend> Iterator for IndexRangeHits<'_, B> {
    type Item = Result<IndexHit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                return Some(Ok(hit));
            }
            let row = match self.scan.next()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err)),
            };
            let Some(cells) = row.family(self.family) else {
                continue;
            };
            for (payload, element_id) in cells {
                if self.start.as_slice() <= payload.as_slice() && payload.as_slice() < self.stop.as_slice() {
                    self.pending.push_back(IndexHit {
                        key: self.key.clone(),
                        value: payload.clone(),
                        element_id: element_id.clone(),
                    });
                }
            }
        }
    }
}

impl<B: StoreBackend> GraphStore<B> {
    fn index_scan(&self, key: &[u8], spec: ScanSpec) -> Result<RowScan<'_, B>> {
        let table = self
            .registry()
            .get(key)
            .ok_or_else(|| GraphStoreError::index_not_found(key))?;
        RowScan::open(self, &table, spec)
    }

    /// Elements of `kind` whose `key` payload equals `value`. Scans
    /// `[value, end_key(value))`.
    pub fn indexed_lookup(&self, kind: ElementKind, key: &[u8], value: &[u8]) -> Result<IndexHits<'_, B>> {
        let family = kind.index_family();
        let spec = ScanSpec::range(value.to_vec(), keys::end_key(value), family, self.scan_caching());
        Ok(IndexHits {
            scan: self.index_scan(key, spec)?,
            family,
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Elements of `kind` whose `key` payload lies in `[start, stop)`. Scans
    /// `[start, end_key(stop))` and filters every qualifier of each row.
    pub fn indexed_range_lookup(
        &self,
        kind: ElementKind,
        key: &[u8],
        start: &[u8],
        stop: &[u8],
    ) -> Result<IndexRangeHits<'_, B>> {
        let family = kind.index_family();
        let spec = ScanSpec::range(start.to_vec(), keys::end_key(stop), family, self.scan_caching());
        Ok(IndexRangeHits {
            scan: self.index_scan(key, spec)?,
            family,
            key: key.to_vec(),
            start: start.to_vec(),
            stop: stop.to_vec(),
            pending: VecDeque::new(),
        })
    }

    pub fn vertex_lookup(&self, key: &[u8], value: &[u8]) -> Result<IndexHits<'_, B>> {
        self.indexed_lookup(ElementKind::Vertex, key, value)
    }

    pub fn edge_lookup(&self, key: &[u8], value: &[u8]) -> Result<IndexHits<'_, B>> {
        self.indexed_lookup(ElementKind::Edge, key, value)
    }

    pub fn vertex_range_lookup(&self, key: &[u8], start: &[u8], stop: &[u8]) -> Result<IndexRangeHits<'_, B>> {
        self.indexed_range_lookup(ElementKind::Vertex, key, start, stop)
    }

    pub fn edge_range_lookup(&self, key: &[u8], start: &[u8], stop: &[u8]) -> Result<IndexRangeHits<'_, B>> {
        self.indexed_range_lookup(ElementKind::Edge, key, start, stop)
    }
}
