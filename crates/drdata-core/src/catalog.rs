//! Raw metadata as reported by a database collaborator.
//!
//! Nothing here is validated; `drdata-introspect` turns a [`RawCatalog`] into
//! a [`crate::SchemaSnapshot`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCatalog {
    pub engine: String,
    pub database: Option<String>,
    pub namespace: String,
    pub tables: Vec<RawTable>,
    pub enums: Vec<RawEnum>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
    pub primary_key: Option<RawKey>,
    pub unique_constraints: Vec<RawKey>,
    pub foreign_keys: Vec<RawForeignKey>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawColumn {
    pub ordinal_position: i16,
    pub name: String,
    /// Formatted type, e.g. `character varying(255)`.
    pub data_type: String,
    pub udt_schema: String,
    pub udt_name: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    /// `ALWAYS` or `BY DEFAULT` for identity columns.
    pub identity_generation: Option<String>,
    pub is_generated: bool,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawKey {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEnum {
    pub schema: String,
    pub name: String,
    pub labels: Vec<String>,
}
