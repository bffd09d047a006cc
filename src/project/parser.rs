use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::ast::{ParsedUnit, SourceParser};
use crate::project::compilation_database::CompileArgsSource;
use crate::project::scanner::{FolderSpec, discover_sources};
use crate::project::ProjectError;

/// Discovers and parses a project's translation units.
///
/// Parsing is the only parallel stage of the engine: discovered files are
/// fanned out over a rayon worker pool and the results are collected into a
/// single-owner map once every worker has finished. Nothing reads the map
/// before the pool joins.
pub struct ProjectParser {
    project_root: PathBuf,
    folders: Vec<FolderSpec>,
    parser: Arc<dyn SourceParser>,
    args_source: Option<Arc<dyn CompileArgsSource>>,
}

impl ProjectParser {
    pub fn new(
        project_root: PathBuf,
        parser: Arc<dyn SourceParser>,
        folders: Vec<FolderSpec>,
        args_source: Option<Arc<dyn CompileArgsSource>>,
    ) -> Self {
        Self {
            project_root,
            folders,
            parser,
            args_source,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Discover and parse every indexable file under the configured roots.
    ///
    /// `on_parse_started` is invoked from worker threads, once per file,
    /// before its parse begins. A failed parse produces a placeholder unit
    /// carrying a fatal diagnostic instead of aborting the build.
    pub fn parse_all(
        &self,
        on_parse_started: &(dyn Fn(&Path) + Sync),
    ) -> Result<HashMap<PathBuf, ParsedUnit>, ProjectError> {
        let files = discover_sources(&self.project_root, &self.folders)?;
        debug!(
            "Discovered {} indexable files under {}",
            files.len(),
            self.project_root.display()
        );

        let units: Vec<(PathBuf, ParsedUnit)> = files
            .par_iter()
            .map(|path| {
                on_parse_started(path);
                (path.clone(), self.parse_one(path))
            })
            .collect();

        Ok(units.into_iter().collect())
    }

    /// Parse a single file with its derived compiler arguments, converting
    /// hard parser failures into a placeholder unit.
    pub fn parse_one(&self, path: &Path) -> ParsedUnit {
        let args = self.compile_args(path);
        match self.parser.parse(path, &args) {
            Ok(unit) => unit,
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                ParsedUnit::from_parse_failure(path.to_path_buf(), e.to_string())
            }
        }
    }

    fn compile_args(&self, path: &Path) -> Vec<String> {
        self.args_source
            .as_ref()
            .and_then(|source| source.args_for(path))
            .unwrap_or_default()
    }
}
