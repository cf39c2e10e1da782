use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use drdata_core::SchemaArtifact;

use crate::error::CliError;

/// Files written by `biopsy --export`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArtifact {
    pub schema_path: PathBuf,
    pub order_path: PathBuf,
}

/// Write `<database>_schema.json` and `<database>_biopsy_insertion_order.json`
/// into `dir`, which must already exist.
pub fn export_artifact(
    dir: &Path,
    database: &str,
    artifact: &SchemaArtifact,
) -> Result<ExportedArtifact, CliError> {
    if !dir.is_dir() {
        return Err(CliError::Usage(format!(
            "export directory '{}' does not exist",
            dir.display()
        )));
    }
    if database.is_empty() || database.contains(['/', '\\']) {
        return Err(CliError::Usage(format!(
            "database name '{database}' cannot be used as a file name"
        )));
    }

    let schema_path = dir.join(format!("{database}_schema.json"));
    let order_path = dir.join(format!("{database}_biopsy_insertion_order.json"));

    write_bytes_atomic(&schema_path, artifact.to_json_pretty()?.as_bytes())?;
    info!(event = "artifact_written", path = %schema_path.display());

    let order = serde_json::to_vec_pretty(&artifact.insertion_order)
        .map_err(drdata_core::Error::from)?;
    write_bytes_atomic(&order_path, &order)?;
    info!(event = "artifact_written", path = %order_path.display());

    Ok(ExportedArtifact {
        schema_path,
        order_path,
    })
}

/// Write to a sibling temp file, then rename over `path`.
fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), CliError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::Usage(format!("invalid output path '{}'", path.display())))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use drdata_core::{SchemaSnapshot, Table};

    use super::*;

    fn artifact() -> SchemaArtifact {
        let table = |name: &str| Table {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
            foreign_keys: Vec::new(),
        };
        SchemaArtifact::from_snapshot(SchemaSnapshot {
            engine: "memory".to_string(),
            database: Some("shop".to_string()),
            namespace: "public".to_string(),
            tables: BTreeMap::from([
                ("customers".to_string(), table("customers")),
                ("orders".to_string(), table("orders")),
            ]),
        })
        .expect("artifact")
    }

    #[test]
    fn writes_schema_and_order_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifact = artifact();

        let exported = export_artifact(dir.path(), "shop", &artifact).expect("export");
        assert_eq!(exported.schema_path, dir.path().join("shop_schema.json"));
        assert_eq!(
            exported.order_path,
            dir.path().join("shop_biopsy_insertion_order.json")
        );

        let schema = fs::read_to_string(&exported.schema_path).expect("read schema");
        assert_eq!(SchemaArtifact::from_json(&schema).expect("parse"), artifact);

        let order: Vec<String> =
            serde_json::from_slice(&fs::read(&exported.order_path).expect("read order"))
                .expect("parse order");
        assert_eq!(order, artifact.insertion_order.tables());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("list")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn export_directory_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");

        let err = export_artifact(&missing, "shop", &artifact()).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert!(!missing.exists());
    }
}
