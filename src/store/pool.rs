//! Unbounded per-table pool of substrate handles.
//!
//! Point operations borrow a handle and return it as soon as the guard goes
//! out of scope. Scans keep their guard for as long as the lazy sequence is
//! alive and give it back when the sequence is exhausted, closed or dropped.

use std::ops::Deref;

use ahash::AHashMap;
use parking_lot::Mutex;

use super::StoreBackend;
use crate::errors::Result;

pub struct TablePool<B: StoreBackend> {
    idle: Mutex<AHashMap<String, Vec<B::Table>>>,
}

impl<B: StoreBackend> Default for TablePool<B> {
    fn default() -> Self {
        Self {
            idle: Mutex::new(AHashMap::new()),
        }
    }
}

impl<B: StoreBackend> TablePool<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes an idle handle for `table`, opening a fresh one when none is idle.
    pub fn borrow<'p>(&'p self, backend: &B, table: &str) -> Result<PooledTable<'p, B>> {
        let idle = self.idle.lock().get_mut(table).and_then(Vec::pop);
        let handle = match idle {
            Some(handle) => handle,
            None => backend.open_table(table)?,
        };
        Ok(PooledTable {
            pool: self,
            table: table.to_string(),
            handle: Some(handle),
        })
    }

    /// Discards idle handles for a table that is being dropped.
    pub fn evict(&self, table: &str) {
        self.idle.lock().remove(table);
    }

    /// Number of idle handles held for `table`.
    pub fn idle_count(&self, table: &str) -> usize {
        self.idle.lock().get(table).map_or(0, Vec::len)
    }

    fn give_back(&self, table: String, handle: B::Table) {
        self.idle.lock().entry(table).or_default().push(handle);
    }
}

/// A borrowed handle; returns itself to the pool on drop.
pub struct PooledTable<'p, B: StoreBackend> {
    pool: &'p TablePool<B>,
    table: String,
    handle: Option<B::Table>,
}

impl<B: StoreBackend> Deref for PooledTable<'_, B> {
    type Target = B::Table;

    fn deref(&self) -> &B::Table {
        self.handle
            .as_ref()
            .unwrap_or_else(|| unreachable!("pooled handle used after release"))
    }
}

impl<B: StoreBackend> Drop for PooledTable<'_, B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.give_back(std::mem::take(&mut self.table), handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Cell, MemoryStore, Selector, TableHandle};

    #[test]
    fn test_handles_are_reused() {
        let store = MemoryStore::new();
        store.create_table("t", &["f"]).unwrap();
        let pool = TablePool::<MemoryStore>::new();
        {
            let a = pool.borrow(&store, "t").unwrap();
            let b = pool.borrow(&store, "t").unwrap();
            a.put(b"r", &[Cell::new("f", "q", "v")]).unwrap();
            assert!(!b.get(b"r", &Selector::Family("f")).unwrap().is_empty());
            assert_eq!(pool.idle_count("t"), 0);
        }
        assert_eq!(pool.idle_count("t"), 2);
        let _c = pool.borrow(&store, "t").unwrap();
        assert_eq!(pool.idle_count("t"), 1);
    }

    #[test]
    fn test_evict_and_missing_table() {
        let store = MemoryStore::new();
        store.create_table("t", &["f"]).unwrap();
        let pool = TablePool::<MemoryStore>::new();
        drop(pool.borrow(&store, "t").unwrap());
        pool.evict("t");
        assert_eq!(pool.idle_count("t"), 0);
        assert!(pool.borrow(&store, "missing").is_err());
    }
}
