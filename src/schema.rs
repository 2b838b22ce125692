//! Table and column-group layout of one graph instance.
//!
//! All names derive from the instance prefix:
//!
//! | table            | column groups          | row key              |
//! |------------------|------------------------|----------------------|
//! | `p_vtx`          | `vtx`, `out`, `in`     | vertex id / vertex id ++ edge id |
//! | `p_vtxp`         | `vtxp`                 | vertex id            |
//! | `p_edg`          | `edg`                  | edge id              |
//! | `p_edgp`         | `edgp`                 | edge id              |
//! | `p_idx_<key>`    | `idx_vtx`, `idx_edg`   | payload ++ element id |

use tracing::{debug, info};

use crate::errors::Result;
use crate::keys;
use crate::store::StoreBackend;

pub const VTX_TABLE: &str = "_vtx";
pub const VTXP_TABLE: &str = "_vtxp";
pub const EDG_TABLE: &str = "_edg";
pub const EDGP_TABLE: &str = "_edgp";
pub const IDX_TABLE: &str = "_idx_";

pub const VTX_CF: &str = "vtx";
pub const VTX_IS_Q: &[u8] = b"is";
pub const VTX_OUT_CF: &str = "out";
pub const VTX_IN_CF: &str = "in";

pub const VTXP_CF: &str = "vtxp";

pub const EDG_CF: &str = "edg";
pub const EDG_IS_Q: &[u8] = b"is";
pub const EDG_OUT_Q: &[u8] = b"out";
pub const EDG_IN_Q: &[u8] = b"in";

pub const EDGP_CF: &str = "edgp";

pub const IDX_VTX_CF: &str = "idx_vtx";
pub const IDX_EDG_CF: &str = "idx_edg";

/// Suffix of the cell holding a property's type discriminator.
pub const TYPE_SUFFIX: &[u8] = b"_type";

/// Existence marker value (boolean true).
pub const TRUE: &[u8] = &[0xff];

/// The two element kinds that carry properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl ElementKind {
    pub fn properties_family(self) -> &'static str {
        match self {
            ElementKind::Vertex => VTXP_CF,
            ElementKind::Edge => EDGP_CF,
        }
    }

    pub fn index_family(self) -> &'static str {
        match self {
            ElementKind::Vertex => IDX_VTX_CF,
            ElementKind::Edge => IDX_EDG_CF,
        }
    }

    pub fn properties_table(self, schema: &Schema) -> &str {
        match self {
            ElementKind::Vertex => &schema.vertex_properties_table,
            ElementKind::Edge => &schema.edge_properties_table,
        }
    }

    /// Table holding the element's existence marker.
    pub fn element_table(self, schema: &Schema) -> &str {
        match self {
            ElementKind::Vertex => &schema.vertex_table,
            ElementKind::Edge => &schema.edge_table,
        }
    }

    pub fn marker_family(self) -> &'static str {
        match self {
            ElementKind::Vertex => VTX_CF,
            ElementKind::Edge => EDG_CF,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Vertex => "vertex",
            ElementKind::Edge => "edge",
        }
    }
}

/// Deterministic table names for one graph instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    prefix: String,
    pub vertex_table: String,
    pub vertex_properties_table: String,
    pub edge_table: String,
    pub edge_properties_table: String,
    index_table_prefix: String,
}

impl Schema {
    /// Builds the layout for `prefix`; the prefix is escaped first.
    pub fn new(prefix: &str) -> Self {
        let prefix = keys::escape(prefix.as_bytes());
        Self {
            vertex_table: format!("{prefix}{VTX_TABLE}"),
            vertex_properties_table: format!("{prefix}{VTXP_TABLE}"),
            edge_table: format!("{prefix}{EDG_TABLE}"),
            edge_properties_table: format!("{prefix}{EDGP_TABLE}"),
            index_table_prefix: format!("{prefix}{IDX_TABLE}"),
            prefix,
        }
    }

    /// The escaped instance prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn index_table(&self, key: &[u8]) -> String {
        format!("{}{}", self.index_table_prefix, keys::escape(key))
    }

    /// Recovers the property key from an index table name, or `None` when the
    /// table does not belong to this instance's indexes.
    pub fn index_key(&self, table: &str) -> Option<Result<Vec<u8>>> {
        table
            .strip_prefix(self.index_table_prefix.as_str())
            .map(keys::unescape)
    }

    fn base_tables(&self) -> [(&str, &'static [&'static str]); 4] {
        [
            (self.vertex_table.as_str(), &[VTX_CF, VTX_OUT_CF, VTX_IN_CF]),
            (self.vertex_properties_table.as_str(), &[VTXP_CF]),
            (self.edge_table.as_str(), &[EDG_CF]),
            (self.edge_properties_table.as_str(), &[EDGP_CF]),
        ]
    }

    /// Creates the four base tables, skipping any that already exist.
    pub fn create_tables<B: StoreBackend>(&self, store: &B) -> Result<()> {
        info!(prefix = %self.prefix, "creating tables");
        for (name, families) in self.base_tables() {
            if store.table_exists(name)? {
                debug!(table = name, "table already exists");
            } else {
                debug!(table = name, "creating table");
                store.create_table(name, families)?;
            }
        }
        Ok(())
    }

    /// Drops the base tables and every index table of this instance.
    pub fn drop_tables<B: StoreBackend>(&self, store: &B) -> Result<()> {
        info!(prefix = %self.prefix, "dropping tables");
        for (name, _) in self.base_tables() {
            if store.table_exists(name)? {
                debug!(table = name, "dropping table");
                store.delete_table(name)?;
            }
        }
        for name in store.list_tables()? {
            if name.starts_with(self.index_table_prefix.as_str()) {
                debug!(table = %name, "dropping table");
                store.delete_table(&name)?;
            }
        }
        Ok(())
    }

    /// Creates the table backing an index on `key`.
    pub fn create_index_table<B: StoreBackend>(&self, store: &B, key: &[u8]) -> Result<String> {
        let name = self.index_table(key);
        store.create_table(&name, &[IDX_VTX_CF, IDX_EDG_CF])?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        let schema = Schema::new("g");
        assert_eq!(schema.vertex_table, "g_vtx");
        assert_eq!(schema.vertex_properties_table, "g_vtxp");
        assert_eq!(schema.edge_table, "g_edg");
        assert_eq!(schema.edge_properties_table, "g_edgp");
        assert_eq!(schema.index_table(b"color"), "g_idx_color");
        assert_eq!(schema.index_table(b"first name"), "g_idx_first_20name");
    }

    #[test]
    fn test_prefix_is_escaped() {
        let schema = Schema::new("my graph");
        assert_eq!(schema.prefix(), "my_20graph");
        assert_eq!(schema.vertex_table, "my_20graph_vtx");
    }

    #[test]
    fn test_index_key_roundtrip() {
        let schema = Schema::new("g");
        let table = schema.index_table(b"a_b c");
        assert_eq!(schema.index_key(&table).unwrap().unwrap(), b"a_b c".to_vec());
        assert!(schema.index_key("g_vtx").is_none());
        assert!(schema.index_key("other_idx_color").is_none());
    }
}
