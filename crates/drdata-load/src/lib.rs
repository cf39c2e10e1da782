//! CSV loading for drdata.
//!
//! Reads CSV files whose headers name table columns, coerces every field to
//! the column's semantic type, and writes tables in insertion order.

pub mod coerce;
pub mod error;
pub mod loader;
pub mod report;

pub use coerce::coerce_field;
pub use error::LoadError;
pub use loader::{CsvLoader, CsvOptions, DirectoryPlan, plan_directory, read_table_csv};
pub use report::{LoadReport, TableLoad};
