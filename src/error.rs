use thiserror::Error;

#[derive(Error, Debug)]
pub enum HaarIndexError {
    // Storage errors
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("storage path error: {0}")]
    StoragePath(#[from] object_store::path::Error),

    #[error("storage url error: {0}")]
    Url(#[from] url::ParseError),

    // Serialization errors
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode serialization error: {0}")]
    Bincode(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    // Signature errors
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    // Index errors
    #[error("record store cannot grow to {requested} slots")]
    CapacityExhausted { requested: usize },

    #[error("internal id space exhausted after id {last}")]
    IdSpaceExhausted { last: u32 },

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    // IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // Internal
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Box<bincode::ErrorKind>> for HaarIndexError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        HaarIndexError::Bincode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HaarIndexError>;

impl HaarIndexError {
    /// Errors after which the in-memory index can no longer be trusted.
    /// Callers should stop serving and rebuild from the durable store.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HaarIndexError::CapacityExhausted { .. } | HaarIndexError::IdSpaceExhausted { .. }
        )
    }
}
