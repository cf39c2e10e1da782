use std::collections::HashMap;

use drdata_core::{RowBatch, Value};

/// Key tuples of tables already written during this run.
///
/// Entries are keyed by table and referenced column list, so composite keys
/// keep their column correspondence. Tuples containing NULL are never stored.
#[derive(Debug, Default)]
pub struct KeyPool {
    entries: HashMap<(String, Vec<String>), Vec<Vec<Value>>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tuples` for `table(columns)`, replacing any earlier entry.
    pub fn commit(&mut self, table: &str, columns: &[String], tuples: Vec<Vec<Value>>) {
        let tuples = tuples
            .into_iter()
            .filter(|tuple| !tuple.iter().any(Value::is_null))
            .collect();
        self.entries
            .insert((table.to_string(), columns.to_vec()), tuples);
    }

    /// Project `columns` out of a written batch. `None` when the batch does
    /// not carry every column.
    pub fn project(batch: &RowBatch, columns: &[String]) -> Option<Vec<Vec<Value>>> {
        let indexes = columns
            .iter()
            .map(|column| batch.column_index(column))
            .collect::<Option<Vec<_>>>()?;
        Some(
            batch
                .rows
                .iter()
                .map(|row| {
                    indexes
                        .iter()
                        .map(|&index| row.get(index).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect(),
        )
    }

    /// Tuples available for `table(columns)`; empty until committed.
    pub fn tuples(&self, table: &str, columns: &[String]) -> &[Vec<Value>] {
        self.entries
            .get(&(table.to_string(), columns.to_vec()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}
