//! The four `drdata` commands, written against the collaborator traits so
//! they run the same against PostgreSQL and the in-memory database.

use std::path::Path;

use tracing::info;

use drdata_core::{Session, truncate_all};
use drdata_generate::{GenerateOptions, GenerationReport, RowGenerator};
use drdata_introspect::load_artifact;
use drdata_load::{CsvLoader, CsvOptions, LoadReport};

use crate::artifacts::{ExportedArtifact, export_artifact};
use crate::error::CliError;

/// Introspect and export the schema artifact.
pub async fn biopsy(
    session: &mut Session<'_>,
    export: &Path,
    fallback_name: Option<&str>,
) -> Result<ExportedArtifact, CliError> {
    if !export.is_dir() {
        return Err(CliError::Usage(format!(
            "export directory '{}' does not exist",
            export.display()
        )));
    }
    let artifact = load_artifact(session).await?;
    let database = artifact
        .schema
        .database
        .clone()
        .or_else(|| fallback_name.map(str::to_string))
        .unwrap_or_else(|| "database".to_string());
    export_artifact(export, &database, &artifact)
}

/// Fill every table with `rows` synthetic rows.
pub async fn inject(
    session: &mut Session<'_>,
    options: GenerateOptions,
    rows: u64,
) -> Result<GenerationReport, CliError> {
    if rows == 0 {
        return Err(CliError::Usage(
            "inject needs a positive row count (--rows or generate.rows)".to_string(),
        ));
    }
    let artifact = load_artifact(session).await?;
    let report = RowGenerator::new(session.database, options)
        .run(&artifact, rows)
        .await?;
    Ok(report)
}

/// Load one CSV file into `destination`, or a directory of `<table>.csv`
/// files.
pub async fn transplant(
    session: &mut Session<'_>,
    source: &Path,
    destination: Option<&str>,
    options: CsvOptions,
) -> Result<LoadReport, CliError> {
    if source.is_file() {
        let table = destination.ok_or_else(|| {
            CliError::Usage("--destination TABLE is required when --source is a file".to_string())
        })?;
        let artifact = load_artifact(session).await?;
        let load = CsvLoader::new(session.database, options)
            .load_file(&artifact.schema, source, table)
            .await?;
        return Ok(LoadReport {
            loaded: vec![load],
            ..LoadReport::default()
        });
    }
    if source.is_dir() {
        let artifact = load_artifact(session).await?;
        let report = CsvLoader::new(session.database, options)
            .load_directory(&artifact, source)
            .await?;
        return Ok(report);
    }
    Err(CliError::Usage(format!(
        "source '{}' is neither a file nor a directory",
        source.display()
    )))
}

/// Truncate every table, children first.
pub async fn cleanse(session: &mut Session<'_>) -> Result<Vec<String>, CliError> {
    let artifact = load_artifact(session).await?;
    let truncated = truncate_all(session.database, &artifact.insertion_order).await?;
    info!(event = "database_cleansed", tables = truncated.len());
    Ok(truncated)
}
