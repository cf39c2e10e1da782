//! In-process [`Database`] used for dry runs and tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::catalog::RawCatalog;
use crate::database::Database;
use crate::error::{DatabaseError, DbErrorKind};
use crate::schema::Table;
use crate::types::SemanticType;
use crate::value::{RowBatch, Value};

type StoredRow = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct MemoryState {
    rows: BTreeMap<String, Vec<StoredRow>>,
    write_log: Vec<String>,
    truncate_log: Vec<String>,
    failing_tables: BTreeSet<String>,
    sequences: BTreeMap<(String, String), i64>,
}

/// Keeps written rows in memory and enforces foreign keys like a real
/// database would, so ordering mistakes surface as constraint errors.
#[derive(Debug)]
pub struct MemoryDatabase {
    catalog: RawCatalog,
    state: Mutex<MemoryState>,
}

impl MemoryDatabase {
    pub fn new(catalog: RawCatalog) -> Self {
        Self {
            catalog,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Make every write to `table` fail with a constraint error.
    pub fn fail_writes_to(&self, table: &str) {
        self.lock().failing_tables.insert(table.to_string());
    }

    /// Tables in the order they were written.
    pub fn write_log(&self) -> Vec<String> {
        self.lock().write_log.clone()
    }

    /// Tables in the order they were truncated.
    pub fn truncate_log(&self) -> Vec<String> {
        self.lock().truncate_log.clone()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().rows.get(table).map(Vec::len).unwrap_or(0)
    }

    /// Every stored value of `column` in `table`.
    pub fn column_values(&self, table: &str, column: &str) -> Vec<Value> {
        self.lock()
            .rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validate and store `batch`, returning the rows as stored.
    fn insert(&self, table: &Table, batch: &RowBatch) -> Result<Vec<StoredRow>, DatabaseError> {
        let mut state = self.lock();
        if state.failing_tables.contains(&table.name) {
            return Err(DatabaseError::new(
                DbErrorKind::Constraint,
                format!("write rejected for table '{}'", table.name),
            ));
        }

        let mut incoming: Vec<StoredRow> = batch
            .rows
            .iter()
            .map(|row| {
                batch
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect();

        // Generated integer columns behave like identity sequences.
        for column in table.columns.iter().filter(|column| column.is_generated) {
            let is_integer = matches!(column.semantic_type, SemanticType::Integer { .. });
            for row in &mut incoming {
                let value = if is_integer {
                    let next = state
                        .sequences
                        .entry((table.name.clone(), column.name.clone()))
                        .or_insert(0);
                    *next += 1;
                    Value::Integer(*next)
                } else {
                    Value::Null
                };
                row.insert(column.name.clone(), value);
            }
        }

        for fk in &table.foreign_keys {
            let mut existing: HashSet<Vec<String>> = HashSet::new();
            let parents = state.rows.get(&fk.referenced_table).into_iter().flatten();
            let same_table = fk
                .is_self_reference(&table.name)
                .then_some(incoming.iter())
                .into_iter()
                .flatten();
            for parent in parents.chain(same_table) {
                existing.insert(key_tuple(parent, &fk.referenced_columns));
            }

            for row in &incoming {
                let values: Vec<&Value> = fk
                    .columns
                    .iter()
                    .map(|column| row.get(column).unwrap_or(&Value::Null))
                    .collect();
                if values.iter().any(|value| value.is_null()) {
                    continue;
                }
                let tuple = key_tuple(row, &fk.columns);
                if !existing.contains(&tuple) {
                    return Err(DatabaseError::new(
                        DbErrorKind::Constraint,
                        format!(
                            "foreign key {} violated by ({})",
                            fk.describe(&table.name),
                            tuple.join(", ")
                        ),
                    ));
                }
            }
        }

        state
            .rows
            .entry(table.name.clone())
            .or_default()
            .extend(incoming.iter().cloned());
        state.write_log.push(table.name.clone());
        Ok(incoming)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn describe_schema(&self) -> Result<RawCatalog, DatabaseError> {
        Ok(self.catalog.clone())
    }

    async fn execute_write(&self, table: &Table, batch: &RowBatch) -> Result<u64, DatabaseError> {
        Ok(self.insert(table, batch)?.len() as u64)
    }

    async fn insert_returning(
        &self,
        table: &Table,
        batch: &RowBatch,
        returning: &[String],
    ) -> Result<Vec<Vec<Value>>, DatabaseError> {
        let inserted = self.insert(table, batch)?;
        Ok(inserted
            .iter()
            .map(|row| {
                returning
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect())
    }

    async fn truncate(&self, table: &str) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        state.rows.remove(table);
        state.truncate_log.push(table.to_string());
        Ok(())
    }
}

fn key_tuple(row: &StoredRow, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| row.get(column).map(Value::key).unwrap_or_default())
        .collect()
}
