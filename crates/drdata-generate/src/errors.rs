use thiserror::Error;

/// Errors emitted by the row generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A non-nullable foreign key points at a table with no rows to draw from.
    #[error(
        "no rows in '{referenced_table}' to satisfy non-nullable foreign key {table}({})",
        .columns.join(", ")
    )]
    UnsatisfiableReference {
        table: String,
        columns: Vec<String>,
        referenced_table: String,
    },
    #[error(
        "no unique value for {table}({}) after {attempts} attempts",
        .columns.join(", ")
    )]
    UniquenessExhausted {
        table: String,
        columns: Vec<String>,
        attempts: u32,
    },
    #[error("cannot generate values for {table}.{column}: {reason}")]
    UnsupportedColumn {
        table: String,
        column: String,
        reason: String,
    },
    #[error(transparent)]
    Core(#[from] drdata_core::Error),
}
