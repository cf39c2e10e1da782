use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{InsertionOrder, resolve_insertion_order};
use crate::schema::{SchemaSnapshot, Table};
use crate::validation::validate_snapshot;

/// Snapshot and the insertion order derived from it, produced together.
///
/// Serializes as `{ "schema": {...}, "insertion_order": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaArtifact {
    pub schema: SchemaSnapshot,
    pub insertion_order: InsertionOrder,
}

impl SchemaArtifact {
    /// Validate `schema` and derive its insertion order.
    pub fn from_snapshot(schema: SchemaSnapshot) -> Result<Self> {
        validate_snapshot(&schema)?;
        let insertion_order = resolve_insertion_order(&schema)?;
        Ok(Self {
            schema,
            insertion_order,
        })
    }

    /// Tables in insertion order.
    pub fn ordered_tables(&self) -> Result<Vec<&Table>> {
        self.insertion_order
            .iter()
            .map(|name| {
                self.schema.table(name).ok_or_else(|| {
                    Error::InvalidArtifact(format!(
                        "insertion order names unknown table '{name}'"
                    ))
                })
            })
            .collect()
    }

    /// The order must list every snapshot table exactly once, each after
    /// the targets of its non-nullable foreign keys.
    pub fn check_consistency(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for name in self.insertion_order.iter() {
            if !seen.insert(name) {
                return Err(Error::InvalidArtifact(format!(
                    "table '{name}' appears twice in insertion order"
                )));
            }
            if self.schema.table(name).is_none() {
                return Err(Error::InvalidArtifact(format!(
                    "insertion order names unknown table '{name}'"
                )));
            }
        }

        if let Some(missing) = self
            .schema
            .table_names()
            .find(|name| !seen.contains(name))
        {
            return Err(Error::InvalidArtifact(format!(
                "table '{missing}' is missing from insertion order"
            )));
        }

        for table in self.schema.tables.values() {
            let position = self.insertion_order.position(&table.name);
            for fk in table.required_foreign_keys() {
                let parent = self.insertion_order.position(&fk.referenced_table);
                if parent.is_none() || parent >= position {
                    return Err(Error::InvalidArtifact(format!(
                        "insertion order puts '{}' before its required parent '{}' ({})",
                        table.name,
                        fk.referenced_table,
                        fk.describe(&table.name)
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: SchemaArtifact = serde_json::from_str(json)?;
        artifact.check_consistency()?;
        Ok(artifact)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
