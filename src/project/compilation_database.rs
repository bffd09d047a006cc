use std::path::{Path, PathBuf};

use json_compilation_db::Entry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilationDatabaseError {
    #[error("Compilation database file not found: {path}")]
    FileNotFound { path: String },
    #[error("Failed to read compilation database file: {error}")]
    ReadError { error: String },
    #[error("Failed to parse compilation database JSON: {error}")]
    ParseError { error: String },
    #[error("Compilation database is empty")]
    EmptyDatabase,
}

/// Per-file compiler argument source consumed by the parse phase.
///
/// Implementations return `None` when they know nothing about a file, in
/// which case the file is parsed with no extra arguments. Called from worker
/// threads.
pub trait CompileArgsSource: Send + Sync {
    fn args_for(&self, file: &Path) -> Option<Vec<String>>;
}

/// Parsed `compile_commands.json` providing structured access to compilation
/// entries. Only include-path (`-I`), macro-definition (`-D`) and warning
/// (`-W`) flags are forwarded to the parser; the rest of a compile command
/// (optimization level, output paths) is irrelevant to indexing.
#[derive(Debug)]
pub struct CompilationDatabase {
    path: PathBuf,
    entries: Vec<Entry>,
}

impl CompilationDatabase {
    /// Load and parse the compilation database at `path`, failing if the
    /// file is missing, unreadable, invalid JSON, or empty.
    pub fn new(path: PathBuf) -> Result<Self, CompilationDatabaseError> {
        if !path.exists() {
            return Err(CompilationDatabaseError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let file = std::fs::File::open(&path).map_err(|e| CompilationDatabaseError::ReadError {
            error: e.to_string(),
        })?;

        let reader = std::io::BufReader::new(file);
        let entries: Vec<Entry> =
            serde_json::from_reader(reader).map_err(|e| CompilationDatabaseError::ParseError {
                error: e.to_string(),
            })?;

        if entries.is_empty() {
            return Err(CompilationDatabaseError::EmptyDatabase);
        }

        Ok(Self { path, entries })
    }

    /// Look for `compile_commands.json` at the project root. `Ok(None)`
    /// means the project simply has no database.
    pub fn from_project_root(
        project_root: &Path,
    ) -> Result<Option<Self>, CompilationDatabaseError> {
        let path = project_root.join("compile_commands.json");
        if !path.exists() {
            return Ok(None);
        }
        Self::new(path).map(Some)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn contains_file(&self, file_path: &Path) -> bool {
        self.entries
            .iter()
            .any(|entry| Self::entry_matches(entry, file_path))
    }

    /// Entries may record the file relative to their working directory.
    fn entry_matches(entry: &Entry, file: &Path) -> bool {
        entry.file == file || entry.directory.join(&entry.file) == file
    }
}

impl CompileArgsSource for CompilationDatabase {
    fn args_for(&self, file: &Path) -> Option<Vec<String>> {
        let mut args: Vec<String> = Vec::new();
        let mut found = false;
        for entry in self
            .entries
            .iter()
            .filter(|entry| Self::entry_matches(entry, file))
        {
            found = true;
            for arg in &entry.arguments {
                let forwarded =
                    arg.starts_with("-I") || arg.starts_with("-D") || arg.starts_with("-W");
                if forwarded && !args.contains(arg) {
                    args.push(arg.clone());
                }
            }
        }
        found.then_some(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_compilation_db(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        temp_file
    }

    #[test]
    fn test_new_with_valid_json() {
        let content = r#"[
            {
                "directory": "/home/user/project",
                "file": "/home/user/project/src/main.cpp",
                "arguments": ["clang++", "-c", "src/main.cpp"]
            },
            {
                "directory": "/home/user/project",
                "file": "src/lib.cpp",
                "command": "clang++ -c src/lib.cpp"
            }
        ]"#;

        let temp_file = create_temp_compilation_db(content);
        let db = CompilationDatabase::new(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(db.entries().len(), 2);
        assert!(db.contains_file(Path::new("/home/user/project/src/main.cpp")));
        assert!(db.contains_file(Path::new("/home/user/project/src/lib.cpp")));
        assert!(!db.contains_file(Path::new("/home/user/project/src/nonexistent.cpp")));
    }

    #[test]
    fn test_new_with_nonexistent_file() {
        let db = CompilationDatabase::new(PathBuf::from("/nonexistent/path/compile_commands.json"));

        match db {
            Err(CompilationDatabaseError::FileNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            _ => panic!("Expected FileNotFound error"),
        }
    }

    #[test]
    fn test_new_with_invalid_json() {
        let content = r#"{ "invalid": "json", "not": ["an", "array"] }"#;
        let temp_file = create_temp_compilation_db(content);
        let db = CompilationDatabase::new(temp_file.path().to_path_buf());

        match db {
            Err(CompilationDatabaseError::ParseError { .. }) => {}
            _ => panic!("Expected ParseError"),
        }
    }

    #[test]
    fn test_new_with_empty_array() {
        let temp_file = create_temp_compilation_db("[]");
        let db = CompilationDatabase::new(temp_file.path().to_path_buf());

        match db {
            Err(CompilationDatabaseError::EmptyDatabase) => {}
            _ => panic!("Expected EmptyDatabase error"),
        }
    }

    #[test]
    fn test_args_restricted_to_include_define_warning_flags() {
        let content = r#"[
            {
                "directory": "/proj",
                "file": "/proj/a.c",
                "arguments": ["cc", "-I/proj/include", "-DDEBUG=1", "-Wall", "-O2", "-c", "a.c", "-o", "a.o"]
            },
            {
                "directory": "/proj",
                "file": "/proj/a.c",
                "arguments": ["cc", "-I/proj/include", "-Wextra", "-c", "a.c"]
            }
        ]"#;
        let temp_file = create_temp_compilation_db(content);
        let db = CompilationDatabase::new(temp_file.path().to_path_buf()).unwrap();

        let args = db.args_for(Path::new("/proj/a.c")).unwrap();
        assert_eq!(args, vec!["-I/proj/include", "-DDEBUG=1", "-Wall", "-Wextra"]);
    }

    #[test]
    fn test_args_for_unknown_file_is_none() {
        let content = r#"[
            {
                "directory": "/proj",
                "file": "/proj/a.c",
                "arguments": ["cc", "-c", "a.c"]
            }
        ]"#;
        let temp_file = create_temp_compilation_db(content);
        let db = CompilationDatabase::new(temp_file.path().to_path_buf()).unwrap();

        assert!(db.args_for(Path::new("/proj/b.c")).is_none());
        // Known file with no forwardable flags still reports an empty list
        assert_eq!(db.args_for(Path::new("/proj/a.c")), Some(vec![]));
    }

    #[test]
    fn test_from_project_root_absent_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            CompilationDatabase::from_project_root(dir.path())
                .unwrap()
                .is_none()
        );

        std::fs::write(
            dir.path().join("compile_commands.json"),
            r#"[{"directory": "/p", "file": "/p/a.c", "command": "cc -c a.c"}]"#,
        )
        .unwrap();
        assert!(
            CompilationDatabase::from_project_root(dir.path())
                .unwrap()
                .is_some()
        );
    }
}
