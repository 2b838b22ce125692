//! Store substrate boundary.
//!
//! The engine talks to a sorted, column-oriented key-value store through two
//! traits: [`StoreBackend`] for administrative calls and for handing out table
//! handles, and [`TableHandle`] for single-row reads, writes and ordered range
//! scans on one table. Two substrates ship with the crate: [`MemoryStore`] and,
//! behind the `sqlite-backend` feature, [`SqliteStore`].

use std::collections::BTreeMap;

use crate::errors::Result;

mod any;
mod memory;
mod pool;
#[cfg(feature = "sqlite-backend")]
mod sqlite;

pub use any::{AnyStore, AnyTable};
pub use memory::{FaultPoint, MemoryStore, MemoryTable};
pub use pool::{PooledTable, TablePool};
#[cfg(feature = "sqlite-backend")]
pub use sqlite::{SqliteStore, SqliteTable};

/// Cells of one column family, keyed by qualifier.
pub type FamilyMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// One cell to write: `(family, qualifier) -> value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub family: &'static str,
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
}

impl Cell {
    pub fn new(family: &'static str, qualifier: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            family,
            qualifier: qualifier.into(),
            value: value.into(),
        }
    }
}

/// Address of a single column within a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub family: &'static str,
    pub qualifier: Vec<u8>,
}

impl Column {
    pub fn new(family: &'static str, qualifier: impl Into<Vec<u8>>) -> Self {
        Self {
            family,
            qualifier: qualifier.into(),
        }
    }
}

/// Which cells a point read returns.
#[derive(Clone, Debug)]
pub enum Selector {
    /// Every cell of one family.
    Family(&'static str),
    /// Exactly these columns.
    Columns(Vec<Column>),
}

impl Selector {
    pub fn column(family: &'static str, qualifier: impl Into<Vec<u8>>) -> Self {
        Selector::Columns(vec![Column::new(family, qualifier)])
    }

    pub(crate) fn matches(&self, family: &str, qualifier: &[u8]) -> bool {
        match self {
            Selector::Family(f) => *f == family,
            Selector::Columns(cols) => cols
                .iter()
                .any(|c| c.family == family && c.qualifier == qualifier),
        }
    }
}

/// A row as returned by a get or a scan. Empty when nothing matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub key: Vec<u8>,
    pub families: BTreeMap<String, FamilyMap>,
}

impl Row {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key,
            families: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.families.values().all(|f| f.is_empty())
    }

    pub fn value(&self, family: &str, qualifier: &[u8]) -> Option<&[u8]> {
        self.families
            .get(family)
            .and_then(|f| f.get(qualifier))
            .map(Vec::as_slice)
    }

    pub fn family(&self, family: &str) -> Option<&FamilyMap> {
        self.families.get(family)
    }

    pub fn insert(&mut self, family: &str, qualifier: Vec<u8>, value: Vec<u8>) {
        self.families
            .entry(family.to_string())
            .or_default()
            .insert(qualifier, value);
    }
}

/// Bounds and filter for an ordered range scan.
#[derive(Clone, Debug)]
pub struct ScanSpec {
    /// Inclusive start row.
    pub start: Vec<u8>,
    /// Exclusive stop row; `None` scans to the end of the table.
    pub stop: Option<Vec<u8>>,
    pub family: &'static str,
    /// Rows fetched per round-trip.
    pub caching: usize,
}

impl ScanSpec {
    pub fn full(family: &'static str, caching: usize) -> Self {
        Self {
            start: Vec::new(),
            stop: None,
            family,
            caching,
        }
    }

    pub fn range(start: Vec<u8>, stop: Option<Vec<u8>>, family: &'static str, caching: usize) -> Self {
        Self {
            start,
            stop,
            family,
            caching,
        }
    }
}

/// Forward-only cursor over scan results, in ascending row-key order.
///
/// Rows without any cell in the scanned family are never yielded.
pub trait RowScanner: Iterator<Item = Result<Row>> + Send {}

impl<T> RowScanner for T where T: Iterator<Item = Result<Row>> + Send {}

/// Data-path operations on one table.
pub trait TableHandle: Send {
    fn name(&self) -> &str;

    fn get(&self, row: &[u8], selector: &Selector) -> Result<Row>;

    /// Writes all cells into one row.
    fn put(&self, row: &[u8], cells: &[Cell]) -> Result<()>;

    /// Deletes every cell of the row.
    fn delete_row(&self, row: &[u8]) -> Result<()>;

    /// Deletes only the listed columns; other cells of the row survive.
    fn delete_columns(&self, row: &[u8], columns: &[Column]) -> Result<()>;

    fn scan(&self, spec: ScanSpec) -> Result<Box<dyn RowScanner>>;
}

/// Administrative operations plus the table-handle factory.
pub trait StoreBackend: Send + Sync {
    type Table: TableHandle;

    /// Fails with `TableExists` when the table is already present.
    fn create_table(&self, name: &str, families: &[&str]) -> Result<()>;

    /// Fails with `TableNotFound` when the table is absent.
    fn delete_table(&self, name: &str) -> Result<()>;

    fn table_exists(&self, name: &str) -> Result<bool>;

    /// All table names in ascending order.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Fails with `TableNotFound` when the table is absent.
    fn open_table(&self, name: &str) -> Result<Self::Table>;
}
