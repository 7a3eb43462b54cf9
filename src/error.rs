use thiserror::Error;

/// Errors raised by the document store and the remote series repository
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection lock poisoned")]
    Poisoned,

    #[error("Remote {kind} '{key}' has no storage handle")]
    MissingHandle { kind: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the catalog service
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    #[error("Local scan failed: {0}")]
    Scan(String),

    #[error("Transcoding {path} failed: {reason}")]
    Transcode { path: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
