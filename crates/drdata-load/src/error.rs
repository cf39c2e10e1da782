use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while loading CSV data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("table '{0}' does not exist")]
    UnknownTable(String),
    #[error("'{}' is not a CSV file", .0.display())]
    NotCsv(PathBuf),
    /// Header names columns the table does not have.
    #[error("table '{table}' has no columns named: {}", .columns.join(", "))]
    SchemaMismatch { table: String, columns: Vec<String> },
    /// More than one file in a directory names the same table.
    #[error("several files name table '{table}': {}", display_paths(.files))]
    AmbiguousFiles { table: String, files: Vec<PathBuf> },
    #[error("column '{column}' appears more than once in the header for '{table}'")]
    DuplicateColumn { table: String, column: String },
    #[error("column {table}.{column} is generated by the database and cannot be loaded")]
    GeneratedColumn { table: String, column: String },
    #[error("row {row}: cannot read '{value}' as {expected} for {table}.{column}")]
    TypeCoercion {
        table: String,
        column: String,
        row: u64,
        value: String,
        expected: String,
    },
    #[error("csv error in '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] drdata_core::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
