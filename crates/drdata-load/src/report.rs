use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One table loaded from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLoad {
    pub table: String,
    pub file: PathBuf,
    pub rows: u64,
}

/// Outcome of a directory load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    /// Tables loaded, in the order they were written.
    pub loaded: Vec<TableLoad>,
    /// Tables without a matching file.
    pub skipped: Vec<String>,
    /// Files whose name matches no table.
    pub unmatched: Vec<PathBuf>,
}

impl LoadReport {
    pub fn rows_loaded(&self) -> u64 {
        self.loaded.iter().map(|load| load.rows).sum()
    }
}
