//! In-process sorted substrate.
//!
//! Tables live in a `BTreeMap` keyed by row, so scans come back in ascending
//! byte order exactly like the real store. Scanners are lazy: each page
//! re-seeks past the last row handed out, so writes that happen between pages
//! are visible to the remainder of the scan.
//!
//! Faults can be armed per store instance to exercise error propagation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::Bound;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use super::{Cell, Column, FamilyMap, Row, RowScanner, ScanSpec, Selector, StoreBackend, TableHandle};
use crate::errors::{GraphStoreError, Result};

/// Operations that can be made to fail on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Get,
    Put,
    Delete,
    /// Opening a scanner.
    Scan,
    /// Fetching a page from an open scanner.
    ScanPage,
    /// Table creation, deletion and listing.
    Admin,
}

#[derive(Default)]
struct MemTable {
    families: BTreeSet<String>,
    rows: BTreeMap<Vec<u8>, BTreeMap<String, FamilyMap>>,
}

#[derive(Default)]
struct Inner {
    tables: RwLock<BTreeMap<String, MemTable>>,
    faults: Mutex<AHashMap<FaultPoint, ArmedFault>>,
}

#[derive(Clone, Copy)]
struct ArmedFault {
    skip: usize,
    failures: usize,
}

impl Inner {
    fn check_fault(&self, point: FaultPoint) -> Result<()> {
        let mut guard = self.faults.lock();
        let Some(armed) = guard.get_mut(&point) else {
            return Ok(());
        };
        if armed.skip > 0 {
            armed.skip -= 1;
            return Ok(());
        }
        armed.failures -= 1;
        if armed.failures == 0 {
            guard.remove(&point);
        }
        Err(GraphStoreError::fault_injection(format!("{point:?}")))
    }
}

/// Sorted in-memory store. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `failures` calls through `point` fail. Zero disarms it.
    pub fn configure_fault(&self, point: FaultPoint, failures: usize) {
        self.configure_fault_after(point, 0, failures);
    }

    /// Lets `skip` calls through `point` succeed, then fails the following `failures`.
    pub fn configure_fault_after(&self, point: FaultPoint, skip: usize, failures: usize) {
        let mut guard = self.inner.faults.lock();
        if failures == 0 {
            guard.remove(&point);
        } else {
            guard.insert(point, ArmedFault { skip, failures });
        }
    }

    pub fn reset_faults(&self) {
        self.inner.faults.lock().clear();
    }

    /// Number of rows in a table, across all families.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        let tables = self.inner.tables.read();
        tables
            .get(table)
            .map(|t| t.rows.len())
            .ok_or_else(|| GraphStoreError::table_not_found(table))
    }
}

impl StoreBackend for MemoryStore {
    type Table = MemoryTable;

    fn create_table(&self, name: &str, families: &[&str]) -> Result<()> {
        self.inner.check_fault(FaultPoint::Admin)?;
        let mut tables = self.inner.tables.write();
        if tables.contains_key(name) {
            return Err(GraphStoreError::table_exists(name));
        }
        let table = MemTable {
            families: families.iter().map(|f| f.to_string()).collect(),
            rows: BTreeMap::new(),
        };
        tables.insert(name.to_string(), table);
        Ok(())
    }

    fn delete_table(&self, name: &str) -> Result<()> {
        self.inner.check_fault(FaultPoint::Admin)?;
        self.inner
            .tables
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| GraphStoreError::table_not_found(name))
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        self.inner.check_fault(FaultPoint::Admin)?;
        Ok(self.inner.tables.read().contains_key(name))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        self.inner.check_fault(FaultPoint::Admin)?;
        Ok(self.inner.tables.read().keys().cloned().collect())
    }

    fn open_table(&self, name: &str) -> Result<MemoryTable> {
        if !self.inner.tables.read().contains_key(name) {
            return Err(GraphStoreError::table_not_found(name));
        }
        Ok(MemoryTable {
            name: name.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Handle to one table of a [`MemoryStore`].
pub struct MemoryTable {
    name: String,
    inner: Arc<Inner>,
}

impl MemoryTable {
    fn missing(&self) -> GraphStoreError {
        GraphStoreError::table_not_found(self.name.as_str())
    }
}

impl TableHandle for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, row: &[u8], selector: &Selector) -> Result<Row> {
        self.inner.check_fault(FaultPoint::Get)?;
        let tables = self.inner.tables.read();
        let table = tables.get(&self.name).ok_or_else(|| self.missing())?;
        let mut out = Row::new(row.to_vec());
        if let Some(stored) = table.rows.get(row) {
            for (family, cells) in stored {
                for (qualifier, value) in cells {
                    if selector.matches(family, qualifier) {
                        out.insert(family, qualifier.clone(), value.clone());
                    }
                }
            }
        }
        Ok(out)
    }

    fn put(&self, row: &[u8], cells: &[Cell]) -> Result<()> {
        self.inner.check_fault(FaultPoint::Put)?;
        let mut tables = self.inner.tables.write();
        let table = tables.get_mut(&self.name).ok_or_else(|| self.missing())?;
        if let Some(cell) = cells.iter().find(|c| !table.families.contains(c.family)) {
            return Err(GraphStoreError::store_io(format!(
                "unknown column family {} in table {}",
                cell.family, self.name
            )));
        }
        if cells.is_empty() {
            return Ok(());
        }
        let stored = table.rows.entry(row.to_vec()).or_default();
        for cell in cells {
            stored
                .entry(cell.family.to_string())
                .or_default()
                .insert(cell.qualifier.clone(), cell.value.clone());
        }
        Ok(())
    }

    fn delete_row(&self, row: &[u8]) -> Result<()> {
        self.inner.check_fault(FaultPoint::Delete)?;
        let mut tables = self.inner.tables.write();
        let table = tables.get_mut(&self.name).ok_or_else(|| self.missing())?;
        table.rows.remove(row);
        Ok(())
    }

    fn delete_columns(&self, row: &[u8], columns: &[Column]) -> Result<()> {
        self.inner.check_fault(FaultPoint::Delete)?;
        let mut tables = self.inner.tables.write();
        let table = tables.get_mut(&self.name).ok_or_else(|| self.missing())?;
        let Some(stored) = table.rows.get_mut(row) else {
            return Ok(());
        };
        for column in columns {
            if let Some(cells) = stored.get_mut(column.family) {
                cells.remove(&column.qualifier);
            }
        }
        stored.retain(|_, cells| !cells.is_empty());
        if stored.is_empty() {
            table.rows.remove(row);
        }
        Ok(())
    }

    fn scan(&self, spec: ScanSpec) -> Result<Box<dyn RowScanner>> {
        self.inner.check_fault(FaultPoint::Scan)?;
        if !self.inner.tables.read().contains_key(&self.name) {
            return Err(self.missing());
        }
        let done = matches!(&spec.stop, Some(stop) if spec.start >= *stop);
        Ok(Box::new(MemoryScanner {
            inner: Arc::clone(&self.inner),
            table: self.name.clone(),
            spec,
            last: None,
            buffer: VecDeque::new(),
            done,
        }))
    }
}

struct MemoryScanner {
    inner: Arc<Inner>,
    table: String,
    spec: ScanSpec,
    last: Option<Vec<u8>>,
    buffer: VecDeque<Row>,
    done: bool,
}

impl MemoryScanner {
    fn fetch_page(&mut self) -> Result<()> {
        self.inner.check_fault(FaultPoint::ScanPage)?;
        let tables = self.inner.tables.read();
        let table = tables
            .get(&self.table)
            .ok_or_else(|| GraphStoreError::table_not_found(self.table.as_str()))?;
        let lower = match &self.last {
            Some(last) => Bound::Excluded(last.clone()),
            None => Bound::Included(self.spec.start.clone()),
        };
        let upper = match &self.spec.stop {
            Some(stop) => Bound::Excluded(stop.clone()),
            None => Bound::Unbounded,
        };
        let caching = self.spec.caching.max(1);
        let mut fetched = 0;
        for (key, families) in table.rows.range((lower, upper)) {
            self.last = Some(key.clone());
            let Some(cells) = families.get(self.spec.family) else {
                continue;
            };
            let mut row = Row::new(key.clone());
            row.families.insert(self.spec.family.to_string(), cells.clone());
            self.buffer.push_back(row);
            fetched += 1;
            if fetched == caching {
                return Ok(());
            }
        }
        self.done = true;
        Ok(())
    }
}

impl Iterator for MemoryScanner {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_table() -> (MemoryStore, MemoryTable) {
        let store = MemoryStore::new();
        store.create_table("t", &["a", "b"]).unwrap();
        let table = store.open_table("t").unwrap();
        (store, table)
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_store, table) = store_with_table();
        table.put(b"r1", &[Cell::new("a", "q", "v")]).unwrap();
        let row = table.get(b"r1", &Selector::Family("a")).unwrap();
        assert_eq!(row.value("a", b"q"), Some(&b"v"[..]));
        assert!(table.get(b"r1", &Selector::Family("b")).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_family_rejected() {
        let (_store, table) = store_with_table();
        let err = table.put(b"r1", &[Cell::new("zz", "q", "v")]).unwrap_err();
        assert!(matches!(err, GraphStoreError::StoreIo(_)));
    }

    #[test]
    fn test_delete_columns_keeps_other_cells() {
        let (store, table) = store_with_table();
        table
            .put(b"r1", &[Cell::new("a", "x", "1"), Cell::new("a", "y", "2")])
            .unwrap();
        table.delete_columns(b"r1", &[Column::new("a", "x")]).unwrap();
        let row = table.get(b"r1", &Selector::Family("a")).unwrap();
        assert_eq!(row.value("a", b"x"), None);
        assert_eq!(row.value("a", b"y"), Some(&b"2"[..]));
        table.delete_columns(b"r1", &[Column::new("a", "y")]).unwrap();
        assert_eq!(store.row_count("t").unwrap(), 0);
    }

    #[test]
    fn test_scan_pages_in_order_and_filters_family() {
        let (_store, table) = store_with_table();
        for i in 0u8..10 {
            table.put(&[i], &[Cell::new("a", "q", vec![i])]).unwrap();
        }
        table.put(&[4, 0], &[Cell::new("b", "q", "other")]).unwrap();
        let spec = ScanSpec::range(vec![2], Some(vec![8]), "a", 3);
        let keys: Vec<Vec<u8>> = table
            .scan(spec)
            .unwrap()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(keys, vec![vec![2], vec![3], vec![4], vec![5], vec![6], vec![7]]);
    }

    #[test]
    fn test_scan_with_inverted_bounds_is_empty() {
        let (_store, table) = store_with_table();
        table.put(b"m", &[Cell::new("a", "q", "v")]).unwrap();
        let spec = ScanSpec::range(b"z".to_vec(), Some(b"a".to_vec()), "a", 10);
        assert_eq!(table.scan(spec).unwrap().count(), 0);
    }

    #[test]
    fn test_table_lifecycle_errors() {
        let store = MemoryStore::new();
        store.create_table("t", &["a"]).unwrap();
        assert!(matches!(
            store.create_table("t", &["a"]),
            Err(GraphStoreError::TableExists(_))
        ));
        store.delete_table("t").unwrap();
        assert!(matches!(
            store.open_table("t"),
            Err(GraphStoreError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_fault_counts_down() {
        let (store, table) = store_with_table();
        store.configure_fault(FaultPoint::Put, 2);
        assert!(table.put(b"r", &[Cell::new("a", "q", "v")]).is_err());
        assert!(table.put(b"r", &[Cell::new("a", "q", "v")]).is_err());
        assert!(table.put(b"r", &[Cell::new("a", "q", "v")]).is_ok());
    }

    #[test]
    fn test_fault_after_skip() {
        let (store, table) = store_with_table();
        store.configure_fault_after(FaultPoint::Get, 2, 1);
        assert!(table.get(b"r", &Selector::Family("a")).is_ok());
        assert!(table.get(b"r", &Selector::Family("a")).is_ok());
        assert!(table.get(b"r", &Selector::Family("a")).is_err());
        assert!(table.get(b"r", &Selector::Family("a")).is_ok());
    }
}
