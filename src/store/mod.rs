//! Persistent schema store.
//!
//! One SQLite file per project root holds the cross-translation-unit
//! relationships (defs, refs, classes, includes). The connection is single
//! owner; all writes for a build or update cycle run inside one transaction
//! committed by the engine, so a crash leaves the store either fully
//! uncommitted or fully committed, never partially populated.

pub mod error;
pub mod schema;

pub use error::{Result, StoreError};

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};
use tracing::debug;

use schema::SCHEMA_SQL;

/// Fixed project-relative name of the store file. Its presence is the sole
/// signal that a project has a persistent index.
pub const INDEX_DB_FILE_NAME: &str = ".cpp-index.db";

/// Location of one canonical definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefRow {
    pub path: PathBuf,
    pub offset: u32,
}

/// One reference site. `enclosing_offset` is the offset of the syntactically
/// enclosing definition in the same file, or `None` at file scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRow {
    pub path: PathBuf,
    pub offset: u32,
    pub enclosing_offset: Option<u32>,
}

/// SQLite-backed index store for one project.
pub struct IndexStore {
    conn: Connection,
    path: PathBuf,
}

impl IndexStore {
    /// Create a new store file and its schema. The engine guards against an
    /// existing index before calling this.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| StoreError::DatabaseOpen {
            path: path.to_owned(),
            source: e,
        })?;

        let store = Self {
            conn,
            path: path.to_owned(),
        };
        store.configure_pragmas()?;
        store.conn.execute_batch(SCHEMA_SQL)?;
        debug!("Created index store at {}", path.display());
        Ok(store)
    }

    /// Reopen an existing store file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StoreError::DatabaseNotFound(path.to_owned()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE).map_err(
            |e| StoreError::DatabaseOpen {
                path: path.to_owned(),
                source: e,
            },
        )?;
        debug!("Opened index store at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_owned(),
        })
    }

    /// In-memory store with the full schema (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.conn.execute_batch(SCHEMA_SQL)?;
        Ok(store)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    /// Begin a write transaction. Insert and delete helpers accept the
    /// transaction via its `Connection` deref.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Close the connection and remove the backing file. The store (and any
    /// engine owning it) must not be used afterwards.
    pub fn close_and_delete(self) -> Result<()> {
        let path = self.path;
        drop(self.conn);
        std::fs::remove_file(&path).map_err(|e| StoreError::DatabaseDelete { path, source: e })?;
        Ok(())
    }

    // ---- point and edge lookups -------------------------------------------

    /// Location of the canonical definition of `usr`, if indexed.
    pub fn definition(&self, usr: &str) -> Result<Option<DefRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT path, offset FROM defs WHERE usr = ?1",
                params![usr],
                |row| {
                    Ok(DefRow {
                        path: PathBuf::from(row.get::<_, String>(0)?),
                        offset: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Every reference site recorded for `usr`.
    pub fn references(&self, usr: &str) -> Result<Vec<RefRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, offset, enclosing_offset FROM refs WHERE usr = ?1")?;
        let rows = stmt.query_map(params![usr], |row| {
            let enclosing: i64 = row.get(2)?;
            Ok(RefRow {
                path: PathBuf::from(row.get::<_, String>(0)?),
                offset: row.get(1)?,
                enclosing_offset: u32::try_from(enclosing).ok(),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Direct superclasses of every USR in `subs` (one BFS layer).
    pub fn superclass_usrs(&self, subs: &[String]) -> Result<Vec<String>> {
        self.class_layer("SELECT super_usr FROM classes WHERE sub_usr = ?1", subs)
    }

    /// Direct subclasses of every USR in `supers` (one BFS layer).
    pub fn subclass_usrs(&self, supers: &[String]) -> Result<Vec<String>> {
        self.class_layer("SELECT sub_usr FROM classes WHERE super_usr = ?1", supers)
    }

    fn class_layer(&self, sql: &str, usrs: &[String]) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut layer = Vec::new();
        for usr in usrs {
            let rows = stmt.query_map(params![usr], |row| row.get::<_, String>(0))?;
            for row in rows {
                layer.push(row?);
            }
        }
        Ok(layer)
    }

    /// Files included directly by `source`, within the include graph of the
    /// translation unit `unit`. Rowid order preserves preprocessor order.
    pub fn direct_includes(&self, unit: &Path, source: &Path) -> Result<Vec<PathBuf>> {
        let mut stmt = self.conn.prepare(
            "SELECT include FROM includes WHERE translation_unit = ?1 AND source = ?2 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![path_str(unit), path_str(source)], |row| {
            row.get::<_, String>(0).map(PathBuf::from)
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Files that directly include `include`, across all translation units.
    pub fn direct_includers(&self, include: &Path) -> Result<Vec<PathBuf>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT source FROM includes WHERE include = ?1 ORDER BY source",
        )?;
        let rows = stmt.query_map(params![path_str(include)], |row| {
            row.get::<_, String>(0).map(PathBuf::from)
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Translation units whose include graph mentions `include`.
    pub fn including_units(&self, include: &Path) -> Result<Vec<PathBuf>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT translation_unit FROM includes WHERE include = ?1 ORDER BY translation_unit",
        )?;
        let rows = stmt.query_map(params![path_str(include)], |row| {
            row.get::<_, String>(0).map(PathBuf::from)
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// One translation unit that includes `path`, directly or transitively.
    /// Headers without their own unit resolve through this.
    pub fn unit_for_header(&self, path: &Path) -> Result<Option<PathBuf>> {
        let row = self
            .conn
            .query_row(
                "SELECT translation_unit FROM includes WHERE include = ?1 LIMIT 1",
                params![path_str(path)],
                |row| row.get::<_, String>(0).map(PathBuf::from),
            )
            .optional()?;
        Ok(row)
    }

    /// Whether `path` appears as an include target of any translation unit.
    pub fn is_include_target(&self, path: &Path) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM includes WHERE include = ?1",
            params![path_str(path)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

// ---- row mutation, called inside the engine's transaction -----------------

/// Record the canonical definition of a USR. First writer wins; later
/// duplicates (e.g. template instantiations) are suppressed.
pub fn insert_def(conn: &Connection, usr: &str, path: &Path, offset: u32) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO defs (usr, path, offset) VALUES (?1, ?2, ?3)",
        params![usr, path_str(path), offset],
    )?;
    Ok(())
}

/// Record a reference site. A given (path, offset) names exactly one USR.
pub fn insert_ref(
    conn: &Connection,
    usr: &str,
    path: &Path,
    offset: u32,
    enclosing_offset: i64,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO refs (usr, path, offset, enclosing_offset) VALUES (?1, ?2, ?3, ?4)",
        params![usr, path_str(path), offset, enclosing_offset],
    )?;
    Ok(())
}

/// Record an inheritance edge, deduplicated per (sub, super) pair.
pub fn insert_class_edge(
    conn: &Connection,
    sub_usr: &str,
    super_usr: &str,
    sub_path: &Path,
    super_path: &Path,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO classes (sub_usr, super_usr, sub_path, super_path) \
         VALUES (?1, ?2, ?3, ?4)",
        params![sub_usr, super_usr, path_str(sub_path), path_str(super_path)],
    )?;
    Ok(())
}

/// Record an include edge within the graph of one translation unit.
pub fn insert_include(
    conn: &Connection,
    translation_unit: &Path,
    source: &Path,
    include: &Path,
    depth: u32,
) -> Result<()> {
    conn.execute(
        "INSERT INTO includes (translation_unit, source, include, depth) VALUES (?1, ?2, ?3, ?4)",
        params![
            path_str(translation_unit),
            path_str(source),
            path_str(include),
            depth
        ],
    )?;
    Ok(())
}

/// Remove every row scoped to `path`: defs and refs recorded in it, class
/// edges touching it, and the include graph of its translation unit. Rows
/// are fully re-derived on update, never patched in place.
pub fn delete_path(conn: &Connection, path: &Path) -> Result<()> {
    let path = path_str(path);
    conn.execute("DELETE FROM defs WHERE path = ?1", params![path])?;
    conn.execute("DELETE FROM refs WHERE path = ?1", params![path])?;
    conn.execute(
        "DELETE FROM classes WHERE sub_path = ?1 OR super_path = ?1",
        params![path],
    )?;
    conn.execute(
        "DELETE FROM includes WHERE translation_unit = ?1",
        params![path],
    )?;
    Ok(())
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> IndexStore {
        IndexStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_defs_first_writer_wins() {
        let store = memory_store();
        insert_def(&store.conn, "c:@F@func", Path::new("/def.c"), 42).unwrap();
        insert_def(&store.conn, "c:@F@func", Path::new("/other.c"), 7).unwrap();

        let row = store.definition("c:@F@func").unwrap().unwrap();
        assert_eq!(row.path, PathBuf::from("/def.c"));
        assert_eq!(row.offset, 42);
    }

    #[test]
    fn test_refs_unique_per_site() {
        let store = memory_store();
        insert_ref(&store.conn, "c:@F@func", Path::new("/ref.c"), 117, 5).unwrap();
        insert_ref(&store.conn, "c:@F@other", Path::new("/ref.c"), 117, 5).unwrap();

        let rows = store.references("c:@F@func").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].enclosing_offset, Some(5));
        assert!(store.references("c:@F@other").unwrap().is_empty());
    }

    #[test]
    fn test_file_scope_ref_has_no_enclosing() {
        let store = memory_store();
        insert_ref(&store.conn, "c:@x", Path::new("/a.c"), 3, -1).unwrap();
        let rows = store.references("c:@x").unwrap();
        assert_eq!(rows[0].enclosing_offset, None);
    }

    #[test]
    fn test_class_edges_deduplicated() {
        let store = memory_store();
        for _ in 0..2 {
            insert_class_edge(
                &store.conn,
                "c:@S@Sub",
                "c:@S@Super",
                Path::new("/a.cpp"),
                Path::new("/b.cpp"),
            )
            .unwrap();
        }
        let supers = store.superclass_usrs(&["c:@S@Sub".into()]).unwrap();
        assert_eq!(supers, vec!["c:@S@Super".to_string()]);
        let subs = store.subclass_usrs(&["c:@S@Super".into()]).unwrap();
        assert_eq!(subs, vec!["c:@S@Sub".to_string()]);
    }

    #[test]
    fn test_delete_path_removes_all_scoped_rows() {
        let store = memory_store();
        let a = Path::new("/a.cpp");
        let b = Path::new("/b.cpp");
        insert_def(&store.conn, "c:@S@A", a, 0).unwrap();
        insert_ref(&store.conn, "c:@S@B", a, 10, -1).unwrap();
        insert_class_edge(&store.conn, "c:@S@A", "c:@S@B", a, b).unwrap();
        insert_include(&store.conn, a, a, Path::new("/h.h"), 1).unwrap();
        insert_include(&store.conn, b, b, Path::new("/h.h"), 1).unwrap();

        delete_path(&store.conn, a).unwrap();

        assert!(store.definition("c:@S@A").unwrap().is_none());
        assert!(store.references("c:@S@B").unwrap().is_empty());
        assert!(store.superclass_usrs(&["c:@S@A".into()]).unwrap().is_empty());
        // b's include graph is untouched
        assert_eq!(store.including_units(Path::new("/h.h")).unwrap(), vec![b]);
    }

    #[test]
    fn test_header_resolution_and_include_lookups() {
        let store = memory_store();
        let a = Path::new("/a.c");
        insert_include(&store.conn, a, a, Path::new("/b.h"), 1).unwrap();
        insert_include(&store.conn, a, Path::new("/b.h"), Path::new("/c.h"), 2).unwrap();

        assert_eq!(
            store.unit_for_header(Path::new("/c.h")).unwrap(),
            Some(a.to_path_buf())
        );
        assert!(store.unit_for_header(Path::new("/d.h")).unwrap().is_none());
        assert!(store.is_include_target(Path::new("/b.h")).unwrap());
        assert!(!store.is_include_target(a).unwrap());

        assert_eq!(
            store.direct_includes(a, Path::new("/b.h")).unwrap(),
            vec![PathBuf::from("/c.h")]
        );
        assert_eq!(
            store.direct_includers(Path::new("/c.h")).unwrap(),
            vec![PathBuf::from("/b.h")]
        );
    }

    #[test]
    fn test_create_open_and_delete_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join(INDEX_DB_FILE_NAME);

        {
            let mut store = IndexStore::create(&db_path).unwrap();
            let tx = store.transaction().unwrap();
            insert_def(&tx, "c:@F@main", Path::new("/main.c"), 0).unwrap();
            tx.commit().unwrap();
        }
        assert!(db_path.exists());

        let store = IndexStore::open(&db_path).unwrap();
        assert!(store.definition("c:@F@main").unwrap().is_some());

        store.close_and_delete().unwrap();
        assert!(!db_path.exists());

        match IndexStore::open(&db_path) {
            Err(StoreError::DatabaseNotFound(p)) => assert_eq!(p, db_path),
            Err(e) => panic!("expected DatabaseNotFound, got {e:?}"),
            Ok(_) => panic!("expected DatabaseNotFound, got an open store"),
        }
    }
}
