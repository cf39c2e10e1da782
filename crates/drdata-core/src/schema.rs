use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraints::{ForeignKey, UniqueConstraint};
use crate::types::SemanticType;

/// Point-in-time view of a database namespace.
///
/// Tables are keyed by name; the map keeps serialization and iteration
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaSnapshot {
    /// Database engine identifier (e.g. `postgres`).
    pub engine: String,
    /// Database name when available.
    pub database: Option<String>,
    /// Namespace the tables were read from (e.g. `public`).
    pub namespace: String,
    pub tables: BTreeMap<String, Table>,
}

impl SchemaSnapshot {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

/// A table with its columns in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Columns a client may supply values for, in declaration order.
    pub fn writable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| !column.is_generated)
    }

    /// Foreign keys that force `referenced_table` to be populated first.
    pub fn required_foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys.iter().filter(|fk| !fk.is_nullable)
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub ordinal_position: i16,
    pub name: String,
    /// Type as declared in the database (e.g. `character varying(40)`).
    pub declared_type: String,
    pub semantic_type: SemanticType,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub is_unique: bool,
    pub is_primary_key: bool,
    /// Identity `ALWAYS` or stored generated column; never written by clients.
    pub is_generated: bool,
}
