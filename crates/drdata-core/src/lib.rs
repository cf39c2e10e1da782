//! Core contracts for drdata.
//!
//! This crate defines the schema snapshot model, the dependency resolver that
//! turns foreign keys into a table insertion order, and the collaborator
//! traits (database, cache) the pipeline crates are written against.

pub mod artifact;
pub mod cache;
pub mod catalog;
pub mod constraints;
pub mod database;
pub mod error;
pub mod graph;
pub mod memory;
pub mod schema;
pub mod session;
pub mod types;
pub mod validation;
pub mod value;

pub use artifact::SchemaArtifact;
pub use cache::{MemoryCache, SchemaCache};
pub use catalog::{RawCatalog, RawColumn, RawEnum, RawForeignKey, RawKey, RawTable};
pub use constraints::{ForeignKey, UniqueConstraint};
pub use database::{Database, truncate_all};
pub use error::{DatabaseError, DbErrorKind, Error, Result};
pub use graph::{DependencyResolver, GraphSummary, InsertionOrder, resolve_insertion_order};
pub use memory::MemoryDatabase;
pub use schema::{Column, SchemaSnapshot, Table};
pub use session::Session;
pub use types::{IntegerWidth, SemanticType, TemporalKind, TextKind};
pub use validation::validate_snapshot;
pub use value::{RowBatch, Value};
