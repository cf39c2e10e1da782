use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use drdata_core::{Database, Error, RowBatch, SchemaArtifact, SchemaSnapshot, Table};

use crate::coerce::coerce_field;
use crate::error::LoadError;
use crate::report::{LoadReport, TableLoad};

/// CSV dialect options.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Loads CSV files into tables through a [`Database`].
pub struct CsvLoader<'a> {
    database: &'a dyn Database,
    options: CsvOptions,
}

impl<'a> CsvLoader<'a> {
    pub fn new(database: &'a dyn Database, options: CsvOptions) -> Self {
        Self { database, options }
    }

    /// Load one file into `table`. The whole file is parsed before anything
    /// is written.
    pub async fn load_file(
        &self,
        snapshot: &SchemaSnapshot,
        path: &Path,
        table: &str,
    ) -> Result<TableLoad, LoadError> {
        let table = snapshot
            .table(table)
            .ok_or_else(|| LoadError::UnknownTable(table.to_string()))?;
        if !is_csv(path) {
            return Err(LoadError::NotCsv(path.to_path_buf()));
        }
        self.load_table(table, path).await
    }

    /// Load every `<table>.csv` in `dir`, parents first.
    ///
    /// Stops at the first failing table; tables loaded before it keep their
    /// rows.
    pub async fn load_directory(
        &self,
        artifact: &SchemaArtifact,
        dir: &Path,
    ) -> Result<LoadReport, LoadError> {
        let plan = plan_directory(artifact, dir)?;
        for file in &plan.unmatched {
            warn!(event = "csv_unmatched", file = %file.display());
        }
        for table in &plan.skipped {
            debug!(event = "table_skipped", table = %table);
        }

        let mut report = LoadReport {
            loaded: Vec::with_capacity(plan.matched.len()),
            skipped: plan.skipped,
            unmatched: plan.unmatched,
        };
        for (name, path) in &plan.matched {
            let table = artifact
                .schema
                .table(name)
                .ok_or_else(|| LoadError::UnknownTable(name.clone()))?;
            report.loaded.push(self.load_table(table, path).await?);
        }

        info!(
            event = "directory_loaded",
            dir = %dir.display(),
            tables = report.loaded.len(),
            rows = report.rows_loaded(),
            skipped = report.skipped.len(),
            unmatched = report.unmatched.len(),
        );
        Ok(report)
    }

    async fn load_table(&self, table: &Table, path: &Path) -> Result<TableLoad, LoadError> {
        let batch = read_table_csv(table, path, self.options.delimiter)?;
        let rows = self
            .database
            .execute_write(table, &batch)
            .await
            .map_err(|source| Error::Database {
                table: table.name.clone(),
                source,
            })?;

        info!(
            event = "table_loaded",
            table = %table.name,
            file = %path.display(),
            rows,
        );
        Ok(TableLoad {
            table: table.name.clone(),
            file: path.to_path_buf(),
            rows,
        })
    }
}

/// Files in a directory matched against an artifact's tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryPlan {
    /// `(table, file)` in insertion order.
    pub matched: Vec<(String, PathBuf)>,
    pub skipped: Vec<String>,
    pub unmatched: Vec<PathBuf>,
}

/// Match `*.csv` files in `dir` to tables by base name.
///
/// Two files naming the same table (e.g. `a.csv` and `a.CSV`) are an error.
pub fn plan_directory(artifact: &SchemaArtifact, dir: &Path) -> Result<DirectoryPlan, LoadError> {
    let mut files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_csv(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(OsStr::to_str) {
            files.entry(stem.to_string()).or_default().push(path.clone());
        }
    }

    let available: BTreeSet<String> = files.keys().cloned().collect();
    let mut matched = Vec::new();
    for table in artifact.insertion_order.restricted_to(&available) {
        let Some(mut paths) = files.remove(&table) else {
            continue;
        };
        paths.sort();
        match paths.pop() {
            Some(path) if paths.is_empty() => matched.push((table, path)),
            Some(path) => {
                paths.push(path);
                return Err(LoadError::AmbiguousFiles { table, files: paths });
            }
            None => {}
        }
    }
    let skipped = artifact
        .insertion_order
        .iter()
        .filter(|table| !available.contains(*table))
        .map(str::to_string)
        .collect();

    Ok(DirectoryPlan {
        matched,
        skipped,
        unmatched: files.into_values().flatten().collect(),
    })
}

/// Parse `path` into a batch for `table`, validating the header and
/// coercing every field.
pub fn read_table_csv(table: &Table, path: &Path, delimiter: u8) -> Result<RowBatch, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(csv_error)?;

    let header: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    let columns = header_columns(table, &header)?;

    let mut batch = RowBatch::new(header);
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let row_number = index as u64 + 1;
        let row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| {
                coerce_field(column, raw).map_err(|expected| LoadError::TypeCoercion {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    row: row_number,
                    value: raw.to_string(),
                    expected,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        batch.rows.push(row);
    }

    debug!(
        event = "csv_parsed",
        table = %table.name,
        file = %path.display(),
        rows = batch.len(),
    );
    Ok(batch)
}

fn header_columns<'t>(
    table: &'t Table,
    header: &[String],
) -> Result<Vec<&'t drdata_core::Column>, LoadError> {
    let mut seen = BTreeSet::new();
    for name in header {
        if !seen.insert(name.as_str()) {
            return Err(LoadError::DuplicateColumn {
                table: table.name.clone(),
                column: name.clone(),
            });
        }
    }

    let unknown: Vec<String> = header
        .iter()
        .filter(|name| table.column(name).is_none())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(LoadError::SchemaMismatch {
            table: table.name.clone(),
            columns: unknown,
        });
    }

    header
        .iter()
        .filter_map(|name| table.column(name))
        .map(|column| {
            if column.is_generated {
                Err(LoadError::GeneratedColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                })
            } else {
                Ok(column)
            }
        })
        .collect()
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
