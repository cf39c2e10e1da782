use std::fmt;

use thiserror::Error;

/// Core error type shared across drdata crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Metadata could not be read or is internally inconsistent.
    #[error("introspection failed: {0}")]
    Introspection(String),
    /// Non-nullable foreign keys form a cycle that no insertion order satisfies.
    #[error("cyclic foreign key dependency between tables: {}", .tables.join(", "))]
    CyclicDependency { tables: Vec<String> },
    /// A collaborator call failed while working on `table`.
    #[error("database error on table '{table}': {source}")]
    Database {
        table: String,
        #[source]
        source: DatabaseError,
    },
    /// A schema artifact does not describe the tables it claims to.
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by drdata crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`crate::Database`] collaborator.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct DatabaseError {
    pub kind: DbErrorKind,
    pub message: String,
}

impl DatabaseError {
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Coarse classification so callers can tell a dead connection from bad data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    Connectivity,
    Constraint,
    Syntax,
    Other,
}

impl fmt::Display for DbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DbErrorKind::Connectivity => "connectivity",
            DbErrorKind::Constraint => "constraint",
            DbErrorKind::Syntax => "syntax",
            DbErrorKind::Other => "database",
        };
        f.write_str(label)
    }
}
