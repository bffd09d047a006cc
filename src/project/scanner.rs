use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::project::ProjectError;

/// Extensions of files parsed as translation units. Headers are deliberately
/// absent: they are indexed through the units that include them.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc"];

/// One configured source root with its exclusion rules.
///
/// Patterns are glob-matched against the file or directory *name*, not the
/// full path, mirroring editor folder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderSpec {
    /// Absolute or project-relative root to walk
    pub path: PathBuf,

    /// Glob patterns for file names to skip (e.g. "*_generated.c")
    #[serde(default)]
    pub file_exclude_patterns: Vec<String>,

    /// Glob patterns for directory names to prune (e.g. "build*")
    #[serde(default)]
    pub folder_exclude_patterns: Vec<String>,

    /// Follow symbolic links during traversal
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl FolderSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Whether a path names a directly-parseable source file.
pub fn is_indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ProjectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ProjectError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ProjectError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

fn resolve_root(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Discover every indexable file under the configured roots.
///
/// With folder specs, each root is walked top-down, pruning directories that
/// match an exclude pattern or coincide with another configured root (so
/// overlapping roots are not walked twice). Without specs the whole project
/// root is walked. Unreadable entries are logged and skipped; a malformed
/// glob pattern fails the whole discovery.
pub fn discover_sources(
    project_root: &Path,
    folders: &[FolderSpec],
) -> Result<Vec<PathBuf>, ProjectError> {
    if !project_root.exists() {
        return Err(ProjectError::PathNotFound {
            path: project_root.to_string_lossy().to_string(),
        });
    }
    if !project_root.is_dir() {
        return Err(ProjectError::NotADirectory {
            path: project_root.to_string_lossy().to_string(),
        });
    }

    let mut found = BTreeSet::new();

    if folders.is_empty() {
        let spec = FolderSpec::new(project_root);
        walk_folder(project_root, &spec, &HashSet::new(), &mut found)?;
    } else {
        let all_roots: HashSet<PathBuf> = folders
            .iter()
            .map(|spec| resolve_root(project_root, &spec.path))
            .collect();

        for spec in folders {
            let root = resolve_root(project_root, &spec.path);
            if !root.is_dir() {
                return Err(ProjectError::NotADirectory {
                    path: root.to_string_lossy().to_string(),
                });
            }
            let mut other_roots = all_roots.clone();
            other_roots.remove(&root);
            walk_folder(&root, spec, &other_roots, &mut found)?;
        }
    }

    Ok(found.into_iter().collect())
}

fn walk_folder(
    root: &Path,
    spec: &FolderSpec,
    other_roots: &HashSet<PathBuf>,
    found: &mut BTreeSet<PathBuf>,
) -> Result<(), ProjectError> {
    let file_excludes = build_globset(&spec.file_exclude_patterns)?;
    let folder_excludes = build_globset(&spec.folder_exclude_patterns)?;

    let walker = WalkDir::new(root)
        .follow_links(spec.follow_symlinks)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            if folder_excludes.is_match(Path::new(entry.file_name())) {
                return false;
            }
            !other_roots.contains(entry.path())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to access directory entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_indexable(path) {
            continue;
        }
        if file_excludes.is_match(Path::new(entry.file_name())) {
            continue;
        }
        found.insert(std::path::absolute(path)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_extension_allow_list() {
        assert!(is_indexable(Path::new("/p/a.c")));
        assert!(is_indexable(Path::new("/p/a.cpp")));
        assert!(is_indexable(Path::new("/p/a.cc")));
        assert!(!is_indexable(Path::new("/p/a.h")));
        assert!(!is_indexable(Path::new("/p/a.hpp")));
        assert!(!is_indexable(Path::new("/p/a.rs")));
        assert!(!is_indexable(Path::new("/p/noext")));
    }

    #[test]
    fn test_discovery_without_folder_specs_walks_whole_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("main.c"));
        touch(&root.join("lib/util.cpp"));
        touch(&root.join("lib/util.h"));
        touch(&root.join("README.md"));

        let files = discover_sources(root, &[]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 2, "only .c/.cpp files should be discovered");
        assert!(names.contains(&"main.c".to_string()));
        assert!(names.contains(&"util.cpp".to_string()));
    }

    #[test]
    fn test_folder_and_file_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("src/main.c"));
        touch(&root.join("src/gen_stub.c"));
        touch(&root.join("src/build-out/artifact.c"));

        let spec = FolderSpec {
            path: PathBuf::from("src"),
            file_exclude_patterns: vec!["gen_*.c".into()],
            folder_exclude_patterns: vec!["build*".into()],
            follow_symlinks: false,
        };
        let files = discover_sources(root, &[spec]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/main.c"));
    }

    #[test]
    fn test_overlapping_roots_are_not_double_walked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/one.c"));
        touch(&root.join("a/nested/two.c"));

        let specs = vec![
            FolderSpec::new(root.join("a")),
            FolderSpec::new(root.join("a/nested")),
        ];
        let files = discover_sources(root, &specs).unwrap();
        // BTreeSet dedups, and the nested root is pruned from the outer walk
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_malformed_pattern_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let spec = FolderSpec {
            path: dir.path().to_path_buf(),
            file_exclude_patterns: vec!["[invalid".into()],
            ..Default::default()
        };
        match discover_sources(dir.path(), &[spec]) {
            Err(ProjectError::InvalidPattern { pattern, .. }) => {
                assert_eq!(pattern, "[invalid");
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_root_is_an_error() {
        match discover_sources(Path::new("/definitely/not/here"), &[]) {
            Err(ProjectError::PathNotFound { .. }) => {}
            other => panic!("expected PathNotFound, got {other:?}"),
        }
    }
}
