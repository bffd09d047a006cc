//! Scripted parser for tests.
//!
//! `ScriptedParser` hands out pre-built [`ParsedUnit`]s by path, standing in
//! for a real compiler front end. Units can be swapped at runtime to
//! simulate a source edit followed by a reparse, and parse calls are counted
//! so tests can assert on cascade behavior.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ast::unit::{ParseError, ParsedUnit, SourceParser};

#[derive(Default)]
pub struct ScriptedParser {
    units: Mutex<HashMap<PathBuf, ParsedUnit>>,
    parse_counts: Mutex<HashMap<PathBuf, usize>>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the unit returned for its path.
    pub fn script(&self, unit: ParsedUnit) {
        self.units.lock().unwrap().insert(unit.path.clone(), unit);
    }

    /// Number of times `parse` was called for `path`.
    pub fn parse_count(&self, path: &Path) -> usize {
        self.parse_counts
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

impl SourceParser for ScriptedParser {
    fn parse(&self, path: &Path, args: &[String]) -> Result<ParsedUnit, ParseError> {
        *self
            .parse_counts
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_insert(0) += 1;

        let mut unit = self
            .units
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ParseError::Backend {
                path: path.to_path_buf(),
                reason: "no scripted unit for path".into(),
            })?;
        unit.args = args.to_vec();
        Ok(unit)
    }
}
