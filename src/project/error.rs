use thiserror::Error;

use crate::project::compilation_database::CompilationDatabaseError;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path does not exist: {path}")]
    PathNotFound { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error(transparent)]
    CompilationDatabase(#[from] CompilationDatabaseError),
}
