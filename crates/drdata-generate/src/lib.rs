//! Synthetic row generation for drdata.
//!
//! Consumes a schema artifact and writes rows table by table in insertion
//! order, drawing foreign key values from the keys of tables already written.

pub mod engine;
pub mod errors;
pub mod generators;
pub mod model;
pub mod pool;

pub use engine::{GeneratedTable, RowGenerator, generate_table};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GenerationReport, TableReport};
pub use pool::KeyPool;
