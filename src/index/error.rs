use std::path::PathBuf;

use thiserror::Error;

use crate::project::ProjectError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("project already has a persistent index at {0}")]
    IndexExists(PathBuf),

    #[error("project has no persistent index at {0}")]
    NoIndex(PathBuf),

    #[error("file is not indexed: {0}")]
    FileNotIndexed(PathBuf),

    #[error("file is already indexed: {0}")]
    FileAlreadyIndexed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}
