//! In-memory map of indexed property keys to their tables.
//!
//! Readers load the current map without locking; writers publish a modified
//! copy. The map is a cache of what the store's table list says and can be
//! rebuilt from it at any time.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;

use crate::keys::to_string_binary;

type IndexMap = BTreeMap<Vec<u8>, String>;

#[derive(Debug)]
pub struct IndexRegistry {
    current: ArcSwap<IndexMap>,
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::new(Arc::new(IndexMap::new())),
        }
    }

    /// Table backing the index on `key`.
    pub fn get(&self, key: &[u8]) -> Option<String> {
        self.current.load().get(key).cloned()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.current.load().contains_key(key)
    }

    pub fn insert(&self, key: &[u8], table: &str) {
        trace!(key = %to_string_binary(key), table, "registering index");
        self.current.rcu(|map| {
            let mut next = IndexMap::clone(map);
            next.insert(key.to_vec(), table.to_string());
            next
        });
    }

    /// Unregisters `key`, returning the table it mapped to.
    pub fn remove(&self, key: &[u8]) -> Option<String> {
        let previous = self.current.rcu(|map| {
            let mut next = IndexMap::clone(map);
            next.remove(key);
            next
        });
        previous.get(key).cloned()
    }

    /// Swaps in a freshly loaded map.
    pub fn replace(&self, entries: impl IntoIterator<Item = (Vec<u8>, String)>) {
        self.current.store(Arc::new(entries.into_iter().collect()));
    }

    pub fn clear(&self) {
        self.current.store(Arc::new(IndexMap::new()));
    }

    pub fn keys(&self) -> BTreeSet<Vec<u8>> {
        self.current.load().keys().cloned().collect()
    }

    pub fn tables(&self) -> Vec<String> {
        self.current.load().values().cloned().collect()
    }

    /// Consistent view of every entry at one point in time.
    pub fn snapshot(&self) -> Arc<IndexMap> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}
