use thiserror::Error;

/// Durable storage failures. Reads that hit one degrade to empty data; writes
/// are reported to the caller, which logs them.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode or decode stored data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a backup document was rejected. Nothing is written until the whole
/// document parses.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("backup version {0} is newer than this build supports")]
    UnsupportedVersion(u32),

    #[error("could not write imported data: {0}")]
    Storage(#[from] StorageError),
}
