use jotter_types::{RecordId, RecordKind};

/// Errors from store and snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record of this kind carries the id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: RecordId },

    /// The collection has handed out every id it can represent.
    #[error("no {0} ids left")]
    IdsExhausted(RecordKind),

    /// I/O error while writing or reading the snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A snapshot write failed and the store runs with strict persistence.
    #[error("snapshot not persisted: {0}")]
    Persistence(String),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(kind: RecordKind, id: RecordId) -> Self {
        Self::NotFound { kind, id }
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
