use thiserror::Error;

/// Error type for tablegraph operations.
///
/// Absent vertices, edges and properties are not errors; they surface as
/// `None` or as empty iterators.
#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("store I/O error: {0}")]
    StoreIo(String),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("table already exists: {0}")]
    TableExists(String),
    #[error("no index for property key: {0}")]
    IndexNotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("fault injected: {0}")]
    FaultInjected(String),
}

pub type Result<T> = std::result::Result<T, GraphStoreError>;

impl GraphStoreError {
    pub fn store_io<T: Into<String>>(msg: T) -> Self {
        GraphStoreError::StoreIo(msg.into())
    }

    pub fn table_not_found<T: Into<String>>(table: T) -> Self {
        GraphStoreError::TableNotFound(table.into())
    }

    pub fn table_exists<T: Into<String>>(table: T) -> Self {
        GraphStoreError::TableExists(table.into())
    }

    pub fn index_not_found(key: &[u8]) -> Self {
        GraphStoreError::IndexNotFound(crate::keys::to_string_binary(key))
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        GraphStoreError::InvalidInput(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GraphStoreError::Serialization(msg.into())
    }

    pub fn fault_injection<T: Into<String>>(msg: T) -> Self {
        GraphStoreError::FaultInjected(msg.into())
    }

    /// True for every failure that originated in the store substrate.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            GraphStoreError::StoreIo(_)
                | GraphStoreError::TableNotFound(_)
                | GraphStoreError::TableExists(_)
                | GraphStoreError::FaultInjected(_)
        )
    }
}

#[cfg(feature = "sqlite-backend")]
impl From<rusqlite::Error> for GraphStoreError {
    fn from(err: rusqlite::Error) -> Self {
        GraphStoreError::StoreIo(err.to_string())
    }
}

impl From<serde_json::Error> for GraphStoreError {
    fn from(err: serde_json::Error) -> Self {
        GraphStoreError::Serialization(err.to_string())
    }
}
