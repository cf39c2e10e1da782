use async_trait::async_trait;
use tracing::info;

use crate::catalog::RawCatalog;
use crate::error::{DatabaseError, Error, Result};
use crate::graph::InsertionOrder;
use crate::schema::Table;
use crate::value::{RowBatch, Value};

/// Database collaborator driven by the pipeline.
///
/// Calls are awaited one at a time; implementations never see two tables
/// written concurrently.
#[async_trait]
pub trait Database: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Read-only metadata for the configured namespace.
    async fn describe_schema(&self) -> std::result::Result<RawCatalog, DatabaseError>;

    /// Persist every row of `batch` into `table`, returning the row count.
    ///
    /// The rows must be committed and visible once this returns.
    async fn execute_write(
        &self,
        table: &Table,
        batch: &RowBatch,
    ) -> std::result::Result<u64, DatabaseError>;

    /// Persist every row of `batch` like [`Database::execute_write`] and
    /// return, per inserted row, the stored values of `returning`.
    ///
    /// Used to learn keys the database assigned itself (identity columns)
    /// for exactly the rows of this batch. Implementations may return values
    /// as text.
    async fn insert_returning(
        &self,
        table: &Table,
        batch: &RowBatch,
        returning: &[String],
    ) -> std::result::Result<Vec<Vec<Value>>, DatabaseError>;

    /// Remove every row of `table`.
    async fn truncate(&self, table: &str) -> std::result::Result<(), DatabaseError>;
}

/// Empty every table, children before parents.
///
/// Stops at the first failure; tables after it are left untouched.
pub async fn truncate_all(database: &dyn Database, order: &InsertionOrder) -> Result<Vec<String>> {
    let mut truncated = Vec::with_capacity(order.len());

    for table in order.truncation_order() {
        database
            .truncate(&table)
            .await
            .map_err(|source| Error::Database {
                table: table.clone(),
                source,
            })?;
        info!(event = "table_truncated", table = %table);
        truncated.push(table);
    }

    Ok(truncated)
}
