use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to open index store at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("index store not found at: {0}")]
    DatabaseNotFound(PathBuf),

    #[error("failed to delete index store at '{path}': {source}")]
    DatabaseDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
