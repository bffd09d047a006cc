//! Top-level engine facade.
//!
//! An [`IndexEngine`] owns the store connection, the in-memory map of parsed
//! translation units and the project parser it was constructed with. All
//! queries resolve a (path, offset) point against the in-memory trees and
//! follow the persisted relationships from there; headers without their own
//! translation unit are resolved through the includes table.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ast::{Diagnostic, ParsedUnit, SourceParser};
use crate::index::builder::build_unit;
use crate::index::error::IndexError;
use crate::index::progress::{ProgressEvent, ProgressObserver};
use crate::project::{
    CompilationDatabase, CompileArgsSource, FolderSpec, ProjectError, ProjectParser,
};
use crate::store::{self, INDEX_DB_FILE_NAME, IndexStore, StoreError};
use crate::symbol::Symbol;

/// Optional collaborators for engine construction.
#[derive(Default)]
pub struct EngineOptions {
    /// Roots to discover sources under; empty means the whole project root.
    pub folders: Vec<FolderSpec>,
    /// Explicit compiler-argument source. When absent, a
    /// `compile_commands.json` at the project root is picked up automatically.
    pub args_source: Option<Arc<dyn CompileArgsSource>>,
    pub observer: Option<Arc<dyn ProgressObserver>>,
}

/// An indexed file and the translation unit that answers queries for it.
/// For a source file the two coincide; a header resolves to one of its
/// includers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub path: PathBuf,
    pub translation_unit: PathBuf,
}

/// One reference site together with its enclosing definition, when the site
/// is not at file scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSite {
    pub reference: Symbol,
    pub enclosing: Option<Symbol>,
}

/// One file visited by an include traversal, with its DFS depth counted
/// from 1 at the immediate edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeEntry {
    pub path: PathBuf,
    pub depth: u32,
}

pub struct IndexEngine {
    project_path: PathBuf,
    store: IndexStore,
    units: HashMap<PathBuf, ParsedUnit>,
    parser: ProjectParser,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine")
            .field("project_path", &self.project_path)
            .finish_non_exhaustive()
    }
}

impl IndexEngine {
    /// Whether `project_path` carries a persistent index. Presence of the
    /// store file is the sole signal.
    pub fn has_persistent_index(project_path: &Path) -> bool {
        project_path.join(INDEX_DB_FILE_NAME).exists()
    }

    /// Build a fresh index for a project without one.
    ///
    /// Parses every discovered file concurrently, then walks all units into
    /// the store inside a single transaction committed at the end. The store
    /// file is only created once the parse phase has succeeded, so a failed
    /// build leaves nothing behind and can simply be retried.
    pub fn from_empty(
        project_path: &Path,
        source_parser: Arc<dyn SourceParser>,
        options: EngineOptions,
    ) -> Result<Self, IndexError> {
        let project_path = std::path::absolute(project_path)?;
        let db_path = project_path.join(INDEX_DB_FILE_NAME);
        if db_path.exists() {
            return Err(IndexError::IndexExists(project_path));
        }

        let parser =
            Self::project_parser(&project_path, source_parser, options.folders, options.args_source)?;
        let observer = options.observer;
        let units = parse_project(&parser, observer.as_deref())?;

        let store = IndexStore::create(&db_path)?;
        let mut engine = Self {
            project_path,
            store,
            units,
            parser,
            observer,
        };
        engine.build_all()?;
        engine.notify(ProgressEvent::Completed {
            project_path: engine.project_path.clone(),
        });
        Ok(engine)
    }

    /// Reopen the persistent index of a project.
    ///
    /// Re-runs the parse phase to reconstruct the in-memory trees; the
    /// relational tables are trusted as-is and not rebuilt.
    pub fn from_persistent(
        project_path: &Path,
        source_parser: Arc<dyn SourceParser>,
        options: EngineOptions,
    ) -> Result<Self, IndexError> {
        let project_path = std::path::absolute(project_path)?;
        let db_path = project_path.join(INDEX_DB_FILE_NAME);
        if !db_path.exists() {
            return Err(IndexError::NoIndex(project_path));
        }

        let store = IndexStore::open(&db_path)?;
        let parser =
            Self::project_parser(&project_path, source_parser, options.folders, options.args_source)?;
        let observer = options.observer;
        let units = parse_project(&parser, observer.as_deref())?;
        let engine = Self {
            project_path,
            store,
            units,
            parser,
            observer,
        };
        engine.notify(ProgressEvent::Completed {
            project_path: engine.project_path.clone(),
        });
        Ok(engine)
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Close the store and delete its backing file, consuming the engine.
    pub fn clean_persistent(self) -> Result<(), IndexError> {
        info!(
            "Removing persistent index of {}",
            self.project_path.display()
        );
        self.store.close_and_delete()?;
        Ok(())
    }

    /// Whether queries can answer for `path`: it is either a parsed
    /// translation unit or an include target of one.
    pub fn indexed(&self, path: &Path) -> Result<bool, IndexError> {
        if self.units.contains_key(path) {
            return Ok(true);
        }
        Ok(self.store.is_include_target(path)?)
    }

    /// Resolve `path` to the translation unit answering for it.
    pub fn file(&self, path: &Path) -> Result<IndexedFile, IndexError> {
        if self.units.contains_key(path) {
            return Ok(IndexedFile {
                path: path.to_owned(),
                translation_unit: path.to_owned(),
            });
        }
        match self.store.unit_for_header(path)? {
            Some(unit) => Ok(IndexedFile {
                path: path.to_owned(),
                translation_unit: unit,
            }),
            None => Err(IndexError::FileNotIndexed(path.to_owned())),
        }
    }

    /// Parse and index one file created after the initial build.
    pub fn add_file(&mut self, path: &Path) -> Result<(), IndexError> {
        let path = std::path::absolute(path)?;
        if self.units.contains_key(&path) {
            return Err(IndexError::FileAlreadyIndexed(path));
        }

        self.notify(ProgressEvent::ParseStarted { path: path.clone() });
        let unit = self.parser.parse_one(&path);
        self.notify(ProgressEvent::IndexingStarted {
            path: path.clone(),
            indexed: 0,
            total: 1,
        });
        let tx = self.store.transaction()?;
        build_unit(&tx, &unit)?;
        tx.commit().map_err(StoreError::from)?;
        self.units.insert(path, unit);
        self.notify(ProgressEvent::Completed {
            project_path: self.project_path.clone(),
        });
        Ok(())
    }

    /// Reparse and re-index `path` after an edit, cascading to every
    /// translation unit whose include graph mentions it.
    ///
    /// The affected set is computed up front on the include graph as it was
    /// before the update; a visited set bounds the computation on circular
    /// includes. Each unit's rows are deleted and re-derived in their own
    /// transaction.
    pub fn update_file(&mut self, path: &Path) -> Result<(), IndexError> {
        let path = std::path::absolute(path)?;
        if !self.indexed(&path)? {
            return Err(IndexError::FileNotIndexed(path));
        }

        let affected = self.affected_units(&path)?;
        debug!(
            "Updating {} cascades to {} translation units",
            path.display(),
            affected.len()
        );
        let total = affected.len();
        for (indexed, unit_path) in affected.iter().enumerate() {
            self.notify(ProgressEvent::ParseStarted {
                path: unit_path.clone(),
            });
            let unit = self.parser.parse_one(unit_path);
            self.notify(ProgressEvent::IndexingStarted {
                path: unit_path.clone(),
                indexed,
                total,
            });
            let tx = self.store.transaction()?;
            store::delete_path(&tx, unit_path)?;
            build_unit(&tx, &unit)?;
            tx.commit().map_err(StoreError::from)?;
            self.units.insert(unit_path.clone(), unit);
        }
        self.notify(ProgressEvent::Completed {
            project_path: self.project_path.clone(),
        });
        Ok(())
    }

    fn affected_units(&self, path: &Path) -> Result<Vec<PathBuf>, IndexError> {
        let mut visited = HashSet::from([path.to_owned()]);
        let mut queue = VecDeque::from([path.to_owned()]);
        let mut affected = Vec::new();
        while let Some(current) = queue.pop_front() {
            if self.units.contains_key(&current) {
                affected.push(current.clone());
            }
            for unit in self.store.including_units(&current)? {
                if visited.insert(unit.clone()) {
                    queue.push_back(unit);
                }
            }
        }
        Ok(affected)
    }

    // ---- queries ----------------------------------------------------------
    //
    // Query misses are empty results, never errors.

    /// Definition of the entity under (path, offset).
    ///
    /// A point on a definition answers itself; a point on a reference follows
    /// the resolved declaration when the parser already sees the definition,
    /// and falls back to the persisted defs table otherwise. That fallback is
    /// what makes cross-translation-unit navigation work.
    pub fn get_definition(&self, path: &Path, offset: u32) -> Result<Option<Symbol>, IndexError> {
        let Some(unit) = self.resolve_unit(path)? else {
            return Ok(None);
        };
        let Some(node) = unit.node_at(path, offset) else {
            return Ok(None);
        };
        if node.is_definition {
            return Ok(Symbol::from_node(node));
        }
        let Some(referenced) = &node.referenced else {
            return Ok(None);
        };
        if referenced.is_definition
            && let Some(loc) = &referenced.location
        {
            return self.symbol_at(&loc.path, loc.offset);
        }
        match self.store.definition(&referenced.usr)? {
            Some(def) => self.symbol_at(&def.path, def.offset),
            None => Ok(None),
        }
    }

    /// Every recorded reference to the entity under (path, offset), with the
    /// enclosing definition of each site.
    pub fn get_references(
        &self,
        path: &Path,
        offset: u32,
    ) -> Result<Vec<ReferenceSite>, IndexError> {
        let Some(unit) = self.resolve_unit(path)? else {
            return Ok(Vec::new());
        };
        let Some(node) = unit.node_at(path, offset) else {
            return Ok(Vec::new());
        };
        let usr = if node.is_definition {
            node.usr.clone()
        } else {
            node.referenced.as_ref().map(|r| r.usr.clone())
        };
        let Some(usr) = usr else {
            return Ok(Vec::new());
        };

        let mut rows = self.store.references(&usr)?;
        rows.sort_by(|a, b| (&a.path, a.offset).cmp(&(&b.path, b.offset)));

        let mut sites = Vec::new();
        for row in rows {
            let Some(reference) = self.symbol_at(&row.path, row.offset)? else {
                debug!("Stale reference row at {}:{}", row.path.display(), row.offset);
                continue;
            };
            let enclosing = match row.enclosing_offset {
                Some(enclosing_offset) => self.symbol_at(&row.path, enclosing_offset)?,
                None => None,
            };
            sites.push(ReferenceSite {
                reference,
                enclosing,
            });
        }
        Ok(sites)
    }

    /// Superclasses of the class under (path, offset), breadth-first: direct
    /// bases first, then theirs, one store round-trip per layer.
    pub fn get_superclasses(&self, path: &Path, offset: u32) -> Result<Vec<Symbol>, IndexError> {
        self.hierarchy(path, offset, IndexStore::superclass_usrs)
    }

    /// Subclasses of the class under (path, offset), breadth-first.
    pub fn get_subclasses(&self, path: &Path, offset: u32) -> Result<Vec<Symbol>, IndexError> {
        self.hierarchy(path, offset, IndexStore::subclass_usrs)
    }

    fn hierarchy<F>(&self, path: &Path, offset: u32, next_layer: F) -> Result<Vec<Symbol>, IndexError>
    where
        F: Fn(&IndexStore, &[String]) -> store::Result<Vec<String>>,
    {
        let Some(start) = self.class_usr_at(path, offset)? else {
            return Ok(Vec::new());
        };
        let mut seen = HashSet::from([start.clone()]);
        let mut layer = vec![start];
        let mut result = Vec::new();
        while !layer.is_empty() {
            let mut next = Vec::new();
            for usr in next_layer(&self.store, &layer)? {
                if seen.insert(usr.clone()) {
                    next.push(usr);
                }
            }
            for usr in &next {
                // USRs without a stored definition stay in the frontier but
                // produce no result entry.
                if let Some(def) = self.store.definition(usr)?
                    && let Some(symbol) = self.symbol_at(&def.path, def.offset)?
                {
                    result.push(symbol);
                }
            }
            layer = next;
        }
        Ok(result)
    }

    fn class_usr_at(&self, path: &Path, offset: u32) -> Result<Option<String>, IndexError> {
        let Some(unit) = self.resolve_unit(path)? else {
            return Ok(None);
        };
        let Some(node) = unit.node_at(path, offset) else {
            return Ok(None);
        };
        if let Some(usr) = &node.usr {
            return Ok(Some(usr.clone()));
        }
        Ok(node.referenced.as_ref().map(|r| r.usr.clone()))
    }

    /// Files included by `path`, preorder depth-first within its translation
    /// unit's include graph. Every edge produces an entry; already-visited
    /// targets are not re-expanded, so circular includes terminate.
    pub fn get_includes(&self, path: &Path) -> Result<Vec<IncludeEntry>, IndexError> {
        let unit = if self.units.contains_key(path) {
            path.to_owned()
        } else {
            match self.store.unit_for_header(path)? {
                Some(unit) => unit,
                None => return Ok(Vec::new()),
            }
        };
        let mut visited = HashSet::from([path.to_owned()]);
        let mut entries = Vec::new();
        self.collect_includes(&unit, path, 1, &mut visited, &mut entries)?;
        Ok(entries)
    }

    fn collect_includes(
        &self,
        unit: &Path,
        source: &Path,
        depth: u32,
        visited: &mut HashSet<PathBuf>,
        out: &mut Vec<IncludeEntry>,
    ) -> Result<(), IndexError> {
        for include in self.store.direct_includes(unit, source)? {
            out.push(IncludeEntry {
                path: include.clone(),
                depth,
            });
            if visited.insert(include.clone()) {
                self.collect_includes(unit, &include, depth + 1, visited, out)?;
            }
        }
        Ok(())
    }

    /// Files that include `path`, preorder depth-first over the reversed
    /// include edges of all translation units.
    pub fn get_includers(&self, path: &Path) -> Result<Vec<IncludeEntry>, IndexError> {
        let mut visited = HashSet::from([path.to_owned()]);
        let mut entries = Vec::new();
        self.collect_includers(path, 1, &mut visited, &mut entries)?;
        Ok(entries)
    }

    fn collect_includers(
        &self,
        include: &Path,
        depth: u32,
        visited: &mut HashSet<PathBuf>,
        out: &mut Vec<IncludeEntry>,
    ) -> Result<(), IndexError> {
        for source in self.store.direct_includers(include)? {
            out.push(IncludeEntry {
                path: source.clone(),
                depth,
            });
            if visited.insert(source.clone()) {
                self.collect_includers(&source, depth + 1, visited, out)?;
            }
        }
        Ok(())
    }

    /// Stored diagnostics of one translation unit, or of all of them in path
    /// order when no file is given.
    pub fn get_diagnostics(&self, path: Option<&Path>) -> Result<Vec<Diagnostic>, IndexError> {
        if let Some(path) = path {
            let Some(unit) = self.resolve_unit(path)? else {
                return Ok(Vec::new());
            };
            return Ok(unit.diagnostics.clone());
        }
        let mut paths: Vec<_> = self.units.keys().collect();
        paths.sort();
        Ok(paths
            .into_iter()
            .flat_map(|p| self.units[p].diagnostics.clone())
            .collect())
    }

    // ---- internals --------------------------------------------------------

    fn project_parser(
        project_path: &Path,
        source_parser: Arc<dyn SourceParser>,
        folders: Vec<FolderSpec>,
        args_source: Option<Arc<dyn CompileArgsSource>>,
    ) -> Result<ProjectParser, IndexError> {
        let args_source = match args_source {
            Some(source) => Some(source),
            None => CompilationDatabase::from_project_root(project_path)
                .map_err(ProjectError::from)?
                .map(|db| Arc::new(db) as Arc<dyn CompileArgsSource>),
        };
        Ok(ProjectParser::new(
            project_path.to_owned(),
            source_parser,
            folders,
            args_source,
        ))
    }

    fn build_all(&mut self) -> Result<(), IndexError> {
        let mut paths: Vec<PathBuf> = self.units.keys().cloned().collect();
        paths.sort();
        let total = paths.len();

        let tx = self.store.transaction()?;
        for (indexed, path) in paths.iter().enumerate() {
            if let Some(observer) = &self.observer {
                observer.on_progress(&ProgressEvent::IndexingStarted {
                    path: path.clone(),
                    indexed,
                    total,
                });
            }
            build_unit(&tx, &self.units[path])?;
        }
        tx.commit().map_err(StoreError::from)?;
        info!(
            "Indexed {} translation units under {}",
            total,
            self.project_path.display()
        );
        Ok(())
    }

    /// Translation unit answering for `path`, following the includes table
    /// for headers. `None` when nothing indexed covers the path.
    fn resolve_unit(&self, path: &Path) -> Result<Option<&ParsedUnit>, IndexError> {
        if let Some(unit) = self.units.get(path) {
            return Ok(Some(unit));
        }
        match self.store.unit_for_header(path)? {
            Some(unit_path) => Ok(self.units.get(&unit_path)),
            None => Ok(None),
        }
    }

    fn symbol_at(&self, path: &Path, offset: u32) -> Result<Option<Symbol>, IndexError> {
        let Some(unit) = self.resolve_unit(path)? else {
            return Ok(None);
        };
        Ok(unit.node_at(path, offset).and_then(Symbol::from_node))
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&event);
        }
    }
}

fn parse_project(
    parser: &ProjectParser,
    observer: Option<&dyn ProgressObserver>,
) -> Result<HashMap<PathBuf, ParsedUnit>, IndexError> {
    let units = parser.parse_all(&|path| {
        if let Some(observer) = observer {
            observer.on_progress(&ProgressEvent::ParseStarted {
                path: path.to_owned(),
            });
        }
    })?;
    Ok(units)
}
