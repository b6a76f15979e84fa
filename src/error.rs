//! Error types for codeatlas
//!
//! Only failures that abort an operation live here. Recoverable outcomes
//! (parse failures, unresolved imports, ambiguous symbol matches, malformed
//! sync rows) are reported as values on the corresponding result types.

/// Result type alias for codeatlas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an indexing run, query, or sync operation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
