use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::SchemaSnapshot;

/// Validate internal consistency of a schema snapshot.
///
/// This checks:
/// - map keys match table names
/// - duplicate columns
/// - primary key and unique columns exist
/// - foreign key columns and referenced targets exist, with matching arity
pub fn validate_snapshot(snapshot: &SchemaSnapshot) -> Result<()> {
    for (key, table) in &snapshot.tables {
        if key != &table.name {
            return Err(Error::Introspection(format!(
                "table registered as '{}' is named '{}'",
                key, table.name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::Introspection(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }

        for column in &table.primary_key {
            if !columns.contains(column.as_str()) {
                return Err(Error::Introspection(format!(
                    "primary key column not found: {}.{}",
                    table.name, column
                )));
            }
        }

        for unique in &table.unique_constraints {
            for column in &unique.columns {
                if !columns.contains(column.as_str()) {
                    return Err(Error::Introspection(format!(
                        "unique column not found: {}.{}",
                        table.name, column
                    )));
                }
            }
        }

        for fk in &table.foreign_keys {
            if fk.columns.is_empty() || fk.columns.len() != fk.referenced_columns.len() {
                return Err(Error::Introspection(format!(
                    "foreign key {} has mismatched column lists",
                    fk.describe(&table.name)
                )));
            }

            for column in &fk.columns {
                if !columns.contains(column.as_str()) {
                    return Err(Error::Introspection(format!(
                        "foreign key column not found: {}.{}",
                        table.name, column
                    )));
                }
            }

            let referenced = snapshot.table(&fk.referenced_table).ok_or_else(|| {
                Error::Introspection(format!(
                    "foreign key {} references a nonexistent table '{}'",
                    fk.describe(&table.name),
                    fk.referenced_table
                ))
            })?;

            for column in &fk.referenced_columns {
                if referenced.column(column).is_none() {
                    return Err(Error::Introspection(format!(
                        "foreign key {} references a nonexistent column '{}.{}'",
                        fk.describe(&table.name),
                        fk.referenced_table,
                        column
                    )));
                }
            }
        }
    }

    Ok(())
}
