use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use drdata_core::{
    Column, Database, Error, ForeignKey, RowBatch, SchemaArtifact, SchemaSnapshot,
    SemanticType, Table, TextKind, Value,
};

use crate::errors::GenerationError;
use crate::generators::{generate_value, unsupported};
use crate::model::{GenerateOptions, GenerationReport, TableReport};
use crate::pool::KeyPool;

/// Fills every table of an artifact with synthetic rows, parents first.
pub struct RowGenerator<'a> {
    database: &'a dyn Database,
    options: GenerateOptions,
}

impl<'a> RowGenerator<'a> {
    pub fn new(database: &'a dyn Database, options: GenerateOptions) -> Self {
        Self { database, options }
    }

    /// Generate and write `rows` rows per table in insertion order.
    ///
    /// Stops at the first failing table; tables written before it keep
    /// their rows.
    pub async fn run(
        &self,
        artifact: &SchemaArtifact,
        rows: u64,
    ) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let mut report = GenerationReport::new(uuid::Uuid::new_v4().to_string(), seed);

        info!(
            event = "generation_started",
            run_id = %report.run_id,
            seed,
            tables = artifact.insertion_order.len(),
            rows,
        );

        match self.run_tables(artifact, rows, seed, &mut report).await {
            Ok(()) => {
                report.duration_ms = start.elapsed().as_millis() as u64;
                info!(
                    event = "generation_finished",
                    run_id = %report.run_id,
                    tables = report.tables.len(),
                    rows_written = report.rows_written(),
                    retries = report.retries_total,
                    duration_ms = report.duration_ms,
                );
                Ok(report)
            }
            Err(err) => {
                warn!(
                    event = "generation_failed",
                    run_id = %report.run_id,
                    tables_written = report.tables.len(),
                    error = %err,
                );
                Err(err)
            }
        }
    }

    async fn run_tables(
        &self,
        artifact: &SchemaArtifact,
        rows: u64,
        seed: u64,
        report: &mut GenerationReport,
    ) -> Result<(), GenerationError> {
        let referenced = referenced_keys(&artifact.schema);
        let mut pool = KeyPool::new();

        for table in artifact.ordered_tables()? {
            let table_start = Instant::now();
            let mut rng = ChaCha8Rng::seed_from_u64(table_seed(seed, &table.name));
            let generated = generate_table(table, rows, &pool, &self.options, &mut rng)?;

            let key_sets = referenced.get(&table.name);
            let needs_returning = key_sets
                .into_iter()
                .flatten()
                .flatten()
                .any(|column| generated.batch.column_index(column).is_none());

            // Keys the database fills itself come back from the insert, so
            // only rows of this run enter the pool.
            let (written, stored) = if !needs_returning {
                let written = self
                    .database
                    .execute_write(table, &generated.batch)
                    .await
                    .map_err(|source| Error::Database {
                        table: table.name.clone(),
                        source,
                    })?;
                (written, None)
            } else {
                let returning: Vec<String> = key_sets
                    .into_iter()
                    .flatten()
                    .flatten()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                let rows = self
                    .database
                    .insert_returning(table, &generated.batch, &returning)
                    .await
                    .map_err(|source| Error::Database {
                        table: table.name.clone(),
                        source,
                    })?;
                let mut stored = RowBatch::new(returning);
                stored.rows = rows;
                (stored.len() as u64, Some(stored))
            };

            let source = stored.as_ref().unwrap_or(&generated.batch);
            for columns in key_sets.into_iter().flatten() {
                let tuples = KeyPool::project(source, columns).unwrap_or_default();
                pool.commit(&table.name, columns, tuples);
            }

            let duration_ms = table_start.elapsed().as_millis() as u64;
            info!(
                event = "table_generated",
                table = %table.name,
                rows_written = written,
                retries = generated.retries,
                duration_ms,
            );
            report.record_table(TableReport {
                table: table.name.clone(),
                rows_requested: rows,
                rows_written: written,
                retries: generated.retries,
                duration_ms,
            });
        }

        Ok(())
    }
}

/// Rows for one table, ready for `execute_write`.
#[derive(Debug, Clone)]
pub struct GeneratedTable {
    pub batch: RowBatch,
    pub retries: u64,
}

enum Source {
    Reference,
    Synthesize,
    AlwaysNull,
}

/// Generate `rows` rows for `table`, drawing foreign keys from `pool`.
pub fn generate_table(
    table: &Table,
    rows: u64,
    pool: &KeyPool,
    options: &GenerateOptions,
    rng: &mut ChaCha8Rng,
) -> Result<GeneratedTable, GenerationError> {
    let null_probability = options.effective_null_probability();
    let max_attempts = options.max_unique_attempts.max(1);

    // Keys over columns the database fills itself are its business.
    let foreign_keys: Vec<&ForeignKey> = table
        .foreign_keys
        .iter()
        .filter(|fk| {
            fk.columns
                .iter()
                .all(|name| table.column(name).is_some_and(|column| !column.is_generated))
        })
        .collect();
    let reference_columns: HashSet<&str> = foreign_keys
        .iter()
        .flat_map(|fk| fk.columns.iter().map(String::as_str))
        .collect();

    let mut plan: Vec<(&Column, Source)> = Vec::new();
    for column in table.writable_columns() {
        let source = if reference_columns.contains(column.name.as_str()) {
            Source::Reference
        } else if column.semantic_type == (SemanticType::Text { text: TextKind::Other }) {
            if column.is_nullable {
                Source::AlwaysNull
            } else if column.default.is_some() {
                continue;
            } else {
                return Err(unsupported(
                    &table.name,
                    column,
                    &format!("no generator for type '{}'", column.declared_type),
                ));
            }
        } else {
            Source::Synthesize
        };
        plan.push((column, source));
    }

    let mut batch = RowBatch::new(plan.iter().map(|(column, _)| column.name.clone()).collect());
    let candidates: Vec<&[Vec<Value>]> = foreign_keys
        .iter()
        .map(|fk| pool.tuples(&fk.referenced_table, &fk.referenced_columns))
        .collect();
    let mut unique_sets = unique_sets(table, &batch);
    let mut retries = 0;

    for _ in 0..rows {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut row = vec![Value::Null; batch.columns.len()];

            for (fk, tuples) in foreign_keys.iter().zip(&candidates) {
                if fk.is_nullable && (tuples.is_empty() || rng.random_bool(null_probability)) {
                    continue;
                }
                let tuple = tuples.choose(rng).ok_or_else(|| {
                    GenerationError::UnsatisfiableReference {
                        table: table.name.clone(),
                        columns: fk.columns.clone(),
                        referenced_table: fk.referenced_table.clone(),
                    }
                })?;
                for (name, value) in fk.columns.iter().zip(tuple) {
                    if let Some(index) = batch.column_index(name) {
                        row[index] = value.clone();
                    }
                }
            }

            for (index, (column, source)) in plan.iter().enumerate() {
                if !matches!(source, Source::Synthesize) {
                    continue;
                }
                let may_be_null = column.is_nullable && !column.is_primary_key;
                if may_be_null && rng.random_bool(null_probability) {
                    continue;
                }
                row[index] = generate_value(&table.name, column, rng)?;
            }

            match claim_unique(&mut unique_sets, &row) {
                Ok(()) => {
                    batch.rows.push(row);
                    break;
                }
                Err(columns) if attempt >= max_attempts => {
                    return Err(GenerationError::UniquenessExhausted {
                        table: table.name.clone(),
                        columns,
                        attempts: max_attempts,
                    });
                }
                Err(_) => retries += 1,
            }
        }
    }

    Ok(GeneratedTable { batch, retries })
}

struct UniqueSet {
    columns: Vec<String>,
    indexes: Vec<usize>,
    seen: HashSet<String>,
}

/// Primary key, unique constraints and unique columns, deduplicated. Sets
/// touching a column absent from the batch are left to the database.
fn unique_sets(table: &Table, batch: &RowBatch) -> Vec<UniqueSet> {
    let mut column_lists: BTreeSet<Vec<String>> = BTreeSet::new();
    if !table.primary_key.is_empty() {
        column_lists.insert(table.primary_key.clone());
    }
    for unique in &table.unique_constraints {
        column_lists.insert(unique.columns.clone());
    }
    for column in table.columns.iter().filter(|column| column.is_unique) {
        column_lists.insert(vec![column.name.clone()]);
    }

    column_lists
        .into_iter()
        .filter_map(|columns| {
            let indexes = columns
                .iter()
                .map(|name| batch.column_index(name))
                .collect::<Option<Vec<_>>>()?;
            Some(UniqueSet {
                columns,
                indexes,
                seen: HashSet::new(),
            })
        })
        .collect()
}

/// Record the row's keys, or return the columns of the first set it
/// collides with. Nothing is recorded on collision.
fn claim_unique(sets: &mut [UniqueSet], row: &[Value]) -> Result<(), Vec<String>> {
    let mut keys = Vec::with_capacity(sets.len());
    for set in sets.iter() {
        let values: Vec<&Value> = set.indexes.iter().map(|&index| &row[index]).collect();
        if values.iter().any(|value| value.is_null()) {
            keys.push(None);
            continue;
        }
        let key = values
            .iter()
            .map(|value| value.key())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        if set.seen.contains(&key) {
            return Err(set.columns.clone());
        }
        keys.push(Some(key));
    }

    for (set, key) in sets.iter_mut().zip(keys) {
        if let Some(key) = key {
            set.seen.insert(key);
        }
    }
    Ok(())
}

/// Referenced column lists per table, over every foreign key in the schema.
fn referenced_keys(schema: &SchemaSnapshot) -> BTreeMap<String, BTreeSet<Vec<String>>> {
    let mut keys: BTreeMap<String, BTreeSet<Vec<String>>> = BTreeMap::new();
    for fk in schema.tables.values().flat_map(|table| &table.foreign_keys) {
        keys.entry(fk.referenced_table.clone())
            .or_default()
            .insert(fk.referenced_columns.clone());
    }
    keys
}

fn table_seed(seed: u64, table: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in table.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
