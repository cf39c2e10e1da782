//! Schema introspection for drdata.
//!
//! Turns the raw catalog reported by a [`drdata_core::Database`] into a
//! validated [`drdata_core::SchemaSnapshot`], and provides the PostgreSQL
//! collaborator.

pub mod introspector;
pub mod mapper;
pub mod options;
pub mod postgres;

pub use introspector::{SchemaIntrospector, load_artifact};
pub use mapper::{build_snapshot, map_semantic_type};
pub use options::IntrospectOptions;
pub use postgres::PostgresDatabase;
