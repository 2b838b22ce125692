//! Runtime-selected substrate, built by [`crate::config::open_graph`].

#[cfg(feature = "sqlite-backend")]
use super::{SqliteStore, SqliteTable};
use super::{
    Cell, Column, MemoryStore, MemoryTable, Row, RowScanner, ScanSpec, Selector, StoreBackend,
    TableHandle,
};
use crate::errors::Result;

#[derive(Clone)]
pub enum AnyStore {
    Memory(MemoryStore),
    #[cfg(feature = "sqlite-backend")]
    Sqlite(SqliteStore),
}

pub enum AnyTable {
    Memory(MemoryTable),
    #[cfg(feature = "sqlite-backend")]
    Sqlite(SqliteTable),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::Memory($inner) => $body,
            #[cfg(feature = "sqlite-backend")]
            Self::Sqlite($inner) => $body,
        }
    };
}

impl StoreBackend for AnyStore {
    type Table = AnyTable;

    fn create_table(&self, name: &str, families: &[&str]) -> Result<()> {
        dispatch!(self, s => s.create_table(name, families))
    }

    fn delete_table(&self, name: &str) -> Result<()> {
        dispatch!(self, s => s.delete_table(name))
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        dispatch!(self, s => s.table_exists(name))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        dispatch!(self, s => s.list_tables())
    }

    fn open_table(&self, name: &str) -> Result<AnyTable> {
        match self {
            Self::Memory(s) => s.open_table(name).map(AnyTable::Memory),
            #[cfg(feature = "sqlite-backend")]
            Self::Sqlite(s) => s.open_table(name).map(AnyTable::Sqlite),
        }
    }
}

impl TableHandle for AnyTable {
    fn name(&self) -> &str {
        dispatch!(self, t => t.name())
    }

    fn get(&self, row: &[u8], selector: &Selector) -> Result<Row> {
        dispatch!(self, t => t.get(row, selector))
    }

    fn put(&self, row: &[u8], cells: &[Cell]) -> Result<()> {
        dispatch!(self, t => t.put(row, cells))
    }

    fn delete_row(&self, row: &[u8]) -> Result<()> {
        dispatch!(self, t => t.delete_row(row))
    }

    fn delete_columns(&self, row: &[u8], columns: &[Column]) -> Result<()> {
        dispatch!(self, t => t.delete_columns(row, columns))
    }

    fn scan(&self, spec: ScanSpec) -> Result<Box<dyn RowScanner>> {
        dispatch!(self, t => t.scan(spec))
    }
}
