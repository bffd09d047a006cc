use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Build and update progress, emitted for the editor layer to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// A file's parse is about to begin.
    ParseStarted { path: PathBuf },

    /// A translation unit's AST walk is about to begin. `indexed` counts the
    /// units already walked in this build, out of `total`.
    IndexingStarted {
        path: PathBuf,
        indexed: usize,
        total: usize,
    },

    /// The build or update cycle finished.
    Completed { project_path: PathBuf },
}

/// Consumer of progress events.
///
/// `ParseStarted` is emitted from parse-pool worker threads, so
/// implementations must be thread safe.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}
