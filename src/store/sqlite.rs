//! SQLite-backed substrate.
//!
//! Each substrate table maps to one `WITHOUT ROWID` SQLite table clustered on
//! `(row, family, qualifier)`. SQLite compares BLOBs with `memcmp`, so row
//! order is byte-lexicographic and range scans need no extra sorting. Column
//! families are recorded in a small catalog.

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value};

use super::{Cell, Column, Row, RowScanner, ScanSpec, Selector, StoreBackend, TableHandle};
use crate::errors::{GraphStoreError, Result};

const CATALOG: &str = r#"
    CREATE TABLE IF NOT EXISTS substrate_tables (
        name TEXT PRIMARY KEY
    );
    CREATE TABLE IF NOT EXISTS substrate_families (
        table_name TEXT NOT NULL,
        family     TEXT NOT NULL,
        PRIMARY KEY (table_name, family)
    );
"#;

fn sql_name(table: &str) -> Result<String> {
    if table.is_empty()
        || !table
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        return Err(GraphStoreError::invalid_input(format!(
            "table name {table:?} is not a valid identifier"
        )));
    }
    Ok(format!("\"tg_{table}\""))
}

fn map_table_err(table: &str, err: rusqlite::Error) -> GraphStoreError {
    if err.to_string().contains("no such table") {
        GraphStoreError::table_not_found(table)
    } else {
        GraphStoreError::from(err)
    }
}

fn is_in_memory_connection(conn: &Connection) -> bool {
    conn.path().is_none_or(|p| p.is_empty() || p == ":memory:")
}

/// SQLite substrate. Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| GraphStoreError::store_io(format!("open failed: {e}")))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| GraphStoreError::store_io(format!("open failed: {e}")))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.set_prepared_statement_cache_capacity(128);
        if !is_in_memory_connection(&conn) {
            if conn.pragma_update(None, "journal_mode", "WAL").is_err() {
                let _ = conn.pragma_update(None, "journal_mode", "DELETE");
            }
            let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        }
        conn.execute_batch(CATALOG)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Applies `PRAGMA key = value`.
    pub fn apply_pragma(&self, key: &str, value: &str) -> Result<()> {
        let sql = format!("PRAGMA {key} = {value}");
        match self.conn.lock().execute(&sql, []) {
            Ok(_) | Err(rusqlite::Error::ExecuteReturnedResults) => Ok(()),
            Err(e) => Err(GraphStoreError::store_io(format!(
                "PRAGMA {key} = {value}: {e}"
            ))),
        }
    }

    fn families(conn: &Connection, table: &str) -> Result<Option<BTreeSet<String>>> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM substrate_tables WHERE name=?1",
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }
        let mut stmt = conn.prepare_cached(
            "SELECT family FROM substrate_families WHERE table_name=?1 ORDER BY family",
        )?;
        let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;
        let mut families = BTreeSet::new();
        for family in rows {
            families.insert(family?);
        }
        Ok(Some(families))
    }
}

impl StoreBackend for SqliteStore {
    type Table = SqliteTable;

    fn create_table(&self, name: &str, families: &[&str]) -> Result<()> {
        let sql_name = sql_name(name)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM substrate_tables WHERE name=?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(GraphStoreError::table_exists(name));
        }
        tx.execute_batch(&format!(
            "CREATE TABLE {sql_name} (
                row       BLOB NOT NULL,
                family    TEXT NOT NULL,
                qualifier BLOB NOT NULL,
                value     BLOB NOT NULL,
                PRIMARY KEY (row, family, qualifier)
            ) WITHOUT ROWID;"
        ))?;
        tx.execute("INSERT INTO substrate_tables(name) VALUES(?1)", params![name])?;
        for family in families {
            tx.execute(
                "INSERT OR IGNORE INTO substrate_families(table_name, family) VALUES(?1, ?2)",
                params![name, family],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_table(&self, name: &str) -> Result<()> {
        let sql_name = sql_name(name)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM substrate_tables WHERE name=?1", params![name])?;
        if removed == 0 {
            return Err(GraphStoreError::table_not_found(name));
        }
        tx.execute(
            "DELETE FROM substrate_families WHERE table_name=?1",
            params![name],
        )?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {sql_name};"))?;
        tx.commit()?;
        Ok(())
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM substrate_tables WHERE name=?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT name FROM substrate_tables ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    fn open_table(&self, name: &str) -> Result<SqliteTable> {
        let sql_name = sql_name(name)?;
        let families = Self::families(&self.conn.lock(), name)?
            .ok_or_else(|| GraphStoreError::table_not_found(name))?;
        Ok(SqliteTable {
            conn: Arc::clone(&self.conn),
            name: name.to_string(),
            sql_name,
            families,
        })
    }
}

/// Handle to one table of a [`SqliteStore`].
pub struct SqliteTable {
    conn: Arc<Mutex<Connection>>,
    name: String,
    sql_name: String,
    families: BTreeSet<String>,
}

impl SqliteTable {
    fn err(&self, err: rusqlite::Error) -> GraphStoreError {
        map_table_err(&self.name, err)
    }

    fn read_family(&self, conn: &Connection, row: &[u8], family: &str, out: &mut Row) -> Result<()> {
        let sql = format!(
            "SELECT qualifier, value FROM {} WHERE row=?1 AND family=?2 ORDER BY qualifier",
            self.sql_name
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(|e| self.err(e))?;
        let cells = stmt
            .query_map(params![row, family], |r| {
                Ok((r.get::<_, Vec<u8>>(0)?, r.get::<_, Vec<u8>>(1)?))
            })
            .map_err(|e| self.err(e))?;
        for cell in cells {
            let (qualifier, value) = cell.map_err(|e| self.err(e))?;
            out.insert(family, qualifier, value);
        }
        Ok(())
    }
}

impl TableHandle for SqliteTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, row: &[u8], selector: &Selector) -> Result<Row> {
        let conn = self.conn.lock();
        let mut out = Row::new(row.to_vec());
        match selector {
            Selector::Family(family) => self.read_family(&conn, row, family, &mut out)?,
            Selector::Columns(columns) => {
                let sql = format!(
                    "SELECT value FROM {} WHERE row=?1 AND family=?2 AND qualifier=?3",
                    self.sql_name
                );
                let mut stmt = conn.prepare_cached(&sql).map_err(|e| self.err(e))?;
                for column in columns {
                    let value: Option<Vec<u8>> = stmt
                        .query_row(params![row, column.family, column.qualifier], |r| r.get(0))
                        .optional()
                        .map_err(|e| self.err(e))?;
                    if let Some(value) = value {
                        out.insert(column.family, column.qualifier.clone(), value);
                    }
                }
            }
        }
        Ok(out)
    }

    fn put(&self, row: &[u8], cells: &[Cell]) -> Result<()> {
        if let Some(cell) = cells.iter().find(|c| !self.families.contains(c.family)) {
            return Err(GraphStoreError::store_io(format!(
                "unknown column family {} in table {}",
                cell.family, self.name
            )));
        }
        if cells.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let sql = format!(
                "INSERT OR REPLACE INTO {}(row, family, qualifier, value) VALUES(?1, ?2, ?3, ?4)",
                self.sql_name
            );
            let mut stmt = tx.prepare_cached(&sql).map_err(|e| self.err(e))?;
            for cell in cells {
                stmt.execute(params![row, cell.family, cell.qualifier, cell.value])
                    .map_err(|e| self.err(e))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_row(&self, row: &[u8]) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            &format!("DELETE FROM {} WHERE row=?1", self.sql_name),
            params![row],
        )
        .map_err(|e| self.err(e))?;
        Ok(())
    }

    fn delete_columns(&self, row: &[u8], columns: &[Column]) -> Result<()> {
        let conn = self.conn.lock();
        let sql = format!(
            "DELETE FROM {} WHERE row=?1 AND family=?2 AND qualifier=?3",
            self.sql_name
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(|e| self.err(e))?;
        for column in columns {
            stmt.execute(params![row, column.family, column.qualifier])
                .map_err(|e| self.err(e))?;
        }
        Ok(())
    }

    fn scan(&self, spec: ScanSpec) -> Result<Box<dyn RowScanner>> {
        if SqliteStore::families(&self.conn.lock(), &self.name)?.is_none() {
            return Err(GraphStoreError::table_not_found(self.name.as_str()));
        }
        let done = matches!(&spec.stop, Some(stop) if spec.start >= *stop);
        Ok(Box::new(SqliteScanner {
            conn: Arc::clone(&self.conn),
            name: self.name.clone(),
            sql_name: self.sql_name.clone(),
            spec,
            last: None,
            buffer: VecDeque::new(),
            done,
        }))
    }
}

struct SqliteScanner {
    conn: Arc<Mutex<Connection>>,
    name: String,
    sql_name: String,
    spec: ScanSpec,
    last: Option<Vec<u8>>,
    buffer: VecDeque<Row>,
    done: bool,
}

impl SqliteScanner {
    /// Loads the next `caching` rows that carry the scanned family.
    fn fetch_page(&mut self) -> Result<()> {
        let conn = self.conn.lock();
        let err = |e: rusqlite::Error| map_table_err(&self.name, e);

        let mut sql = format!("SELECT DISTINCT row FROM {} WHERE family=?1", self.sql_name);
        let mut args = vec![Value::Text(self.spec.family.to_string())];
        match &self.last {
            Some(last) => {
                sql.push_str(" AND row > ?2");
                args.push(Value::Blob(last.clone()));
            }
            None => {
                sql.push_str(" AND row >= ?2");
                args.push(Value::Blob(self.spec.start.clone()));
            }
        }
        if let Some(stop) = &self.spec.stop {
            sql.push_str(" AND row < ?3");
            args.push(Value::Blob(stop.clone()));
        }
        let caching = self.spec.caching.max(1);
        sql.push_str(&format!(" ORDER BY row LIMIT {caching}"));

        let keys: Vec<Vec<u8>> = {
            let mut stmt = conn.prepare_cached(&sql).map_err(err)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), |r| r.get::<_, Vec<u8>>(0))
                .map_err(err)?;
            let mut keys = Vec::new();
            for key in rows {
                keys.push(key.map_err(err)?);
            }
            keys
        };
        if keys.len() < caching {
            self.done = true;
        }
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            self.done = true;
            return Ok(());
        };

        let sql = format!(
            "SELECT row, qualifier, value FROM {} \
             WHERE family=?1 AND row >= ?2 AND row <= ?3 ORDER BY row, qualifier",
            self.sql_name
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(err)?;
        let cells = stmt
            .query_map(params![self.spec.family, first, last], |r| {
                Ok((
                    r.get::<_, Vec<u8>>(0)?,
                    r.get::<_, Vec<u8>>(1)?,
                    r.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(err)?;
        let mut current: Option<Row> = None;
        for cell in cells {
            let (key, qualifier, value) = cell.map_err(err)?;
            if current.as_ref().is_some_and(|row| row.key != key) {
                self.buffer.extend(current.take());
            }
            current
                .get_or_insert_with(|| Row::new(key))
                .insert(self.spec.family, qualifier, value);
        }
        self.buffer.extend(current);
        self.last = Some(last.clone());
        Ok(())
    }
}

impl Iterator for SqliteScanner {
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
