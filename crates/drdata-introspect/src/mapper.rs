//! Raw catalog to snapshot mapping.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use drdata_core::{
    Column, Error, ForeignKey, IntegerWidth, RawCatalog, RawColumn, RawEnum, RawForeignKey,
    RawTable, Result, SchemaSnapshot, SemanticType, Table, TemporalKind, TextKind,
    UniqueConstraint, validate_snapshot,
};

type EnumIndex = HashMap<(String, String), Vec<String>>;

/// Map a raw column's type name onto the closed set of semantic types.
pub fn map_semantic_type(column: &RawColumn, enums: &[RawEnum]) -> SemanticType {
    let index = index_enums(enums);
    semantic_type(column, &index)
}

fn semantic_type(column: &RawColumn, enums: &EnumIndex) -> SemanticType {
    match column.udt_name.as_str() {
        "int2" => SemanticType::Integer {
            width: IntegerWidth::Small,
        },
        "int4" | "serial" => SemanticType::Integer {
            width: IntegerWidth::Regular,
        },
        "int8" | "bigserial" => SemanticType::Integer {
            width: IntegerWidth::Big,
        },
        "float4" | "float8" | "numeric" | "money" => SemanticType::Float,
        "bool" => SemanticType::Boolean,
        "date" => temporal(TemporalKind::Date),
        "time" | "timetz" => temporal(TemporalKind::Time),
        "timestamp" => temporal(TemporalKind::Timestamp),
        "timestamptz" => temporal(TemporalKind::TimestampTz),
        "bytea" => SemanticType::Binary,
        "uuid" => text(TextKind::Uuid),
        "json" | "jsonb" => text(TextKind::Json),
        "text" | "varchar" | "bpchar" | "name" | "citext" => text(TextKind::Plain),
        other => match enums.get(&(column.udt_schema.clone(), other.to_string())) {
            Some(labels) => text(TextKind::Enum {
                labels: labels.clone(),
            }),
            None => text(TextKind::Other),
        },
    }
}

fn temporal(temporal: TemporalKind) -> SemanticType {
    SemanticType::DateTime { temporal }
}

fn text(text: TextKind) -> SemanticType {
    SemanticType::Text { text }
}

fn index_enums(enums: &[RawEnum]) -> EnumIndex {
    enums
        .iter()
        .map(|en| ((en.schema.clone(), en.name.clone()), en.labels.clone()))
        .collect()
}

/// Build and validate a snapshot from a raw catalog.
pub fn build_snapshot(catalog: RawCatalog) -> Result<SchemaSnapshot> {
    let enums = index_enums(&catalog.enums);
    let mut tables = BTreeMap::new();

    for raw in catalog.tables {
        let name = raw.name.clone();
        let table = map_table(raw, &catalog.namespace, &enums)?;
        if tables.insert(name.clone(), table).is_some() {
            return Err(Error::Introspection(format!(
                "table '{name}' reported more than once"
            )));
        }
    }

    let snapshot = SchemaSnapshot {
        engine: catalog.engine,
        database: catalog.database,
        namespace: catalog.namespace,
        tables,
    };
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn map_table(raw: RawTable, namespace: &str, enums: &EnumIndex) -> Result<Table> {
    let primary_key = raw
        .primary_key
        .map(|pk| pk.columns)
        .unwrap_or_default();

    let mut single_unique: BTreeSet<&str> = raw
        .unique_constraints
        .iter()
        .filter(|key| key.columns.len() == 1)
        .map(|key| key.columns[0].as_str())
        .collect();
    if let [only] = primary_key.as_slice() {
        single_unique.insert(only.as_str());
    }

    let mut raw_columns = raw.columns;
    raw_columns.sort_by_key(|column| column.ordinal_position);

    let columns: Vec<Column> = raw_columns
        .iter()
        .map(|column| Column {
            ordinal_position: column.ordinal_position,
            name: column.name.clone(),
            declared_type: column.data_type.clone(),
            semantic_type: semantic_type(column, enums),
            is_nullable: column.is_nullable,
            default: column.default.clone(),
            max_length: column.character_max_length,
            numeric_precision: column.numeric_precision,
            numeric_scale: column.numeric_scale,
            is_unique: single_unique.contains(column.name.as_str()),
            is_primary_key: primary_key.contains(&column.name),
            is_generated: column.is_generated
                || column.identity_generation.as_deref() == Some("ALWAYS"),
        })
        .collect();

    let unique_constraints = raw
        .unique_constraints
        .iter()
        .map(|key| UniqueConstraint {
            name: Some(key.name.clone()),
            columns: key.columns.clone(),
        })
        .collect();

    let foreign_keys = raw
        .foreign_keys
        .into_iter()
        .map(|fk| map_foreign_key(&raw.name, fk, namespace, &columns))
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        name: raw.name,
        columns,
        primary_key,
        unique_constraints,
        foreign_keys,
    })
}

fn map_foreign_key(
    table: &str,
    raw: RawForeignKey,
    namespace: &str,
    columns: &[Column],
) -> Result<ForeignKey> {
    if raw.referenced_schema != namespace {
        return Err(Error::Introspection(format!(
            "foreign key '{}' on '{table}' references '{}.{}' outside namespace '{namespace}'",
            raw.name, raw.referenced_schema, raw.referenced_table
        )));
    }

    let mut is_nullable = !raw.columns.is_empty();
    for name in &raw.columns {
        let column = columns
            .iter()
            .find(|column| &column.name == name)
            .ok_or_else(|| {
                Error::Introspection(format!(
                    "foreign key '{}' on '{table}' uses missing column '{name}'",
                    raw.name
                ))
            })?;
        is_nullable &= column.is_nullable;
    }

    Ok(ForeignKey {
        name: Some(raw.name),
        columns: raw.columns,
        referenced_table: raw.referenced_table,
        referenced_columns: raw.referenced_columns,
        is_nullable,
    })
}

#[cfg(test)]
mod tests {
    use drdata_core::{RawKey, RawTable};

    use super::*;

    fn column(position: i16, name: &str, udt: &str, nullable: bool) -> RawColumn {
        RawColumn {
            ordinal_position: position,
            name: name.to_string(),
            data_type: udt.to_string(),
            udt_schema: "pg_catalog".to_string(),
            udt_name: udt.to_string(),
            is_nullable: nullable,
            ..RawColumn::default()
        }
    }

    fn catalog(tables: Vec<RawTable>) -> RawCatalog {
        RawCatalog {
            engine: "postgres".to_string(),
            database: Some("shop".to_string()),
            namespace: "public".to_string(),
            tables,
            enums: Vec::new(),
        }
    }

    fn fk(name: &str, columns: &[&str], table: &str, referenced: &[&str]) -> RawForeignKey {
        RawForeignKey {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_schema: "public".to_string(),
            referenced_table: table.to_string(),
            referenced_columns: referenced.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn maps_type_names() {
        let cases = [
            ("int2", SemanticType::Integer { width: IntegerWidth::Small }),
            ("int8", SemanticType::Integer { width: IntegerWidth::Big }),
            ("numeric", SemanticType::Float),
            ("bool", SemanticType::Boolean),
            ("timestamptz", temporal(TemporalKind::TimestampTz)),
            ("bytea", SemanticType::Binary),
            ("uuid", text(TextKind::Uuid)),
            ("jsonb", text(TextKind::Json)),
            ("varchar", text(TextKind::Plain)),
            ("_int4", text(TextKind::Other)),
            ("inet", text(TextKind::Other)),
        ];
        for (udt, expected) in cases {
            assert_eq!(map_semantic_type(&column(1, "c", udt, true), &[]), expected, "{udt}");
        }
    }

    #[test]
    fn enum_types_carry_labels() {
        let mut mood = column(1, "mood", "mood", false);
        mood.udt_schema = "public".to_string();
        let enums = vec![RawEnum {
            schema: "public".to_string(),
            name: "mood".to_string(),
            labels: vec!["sad".to_string(), "ok".to_string()],
        }];

        assert_eq!(
            map_semantic_type(&mood, &enums),
            text(TextKind::Enum {
                labels: vec!["sad".to_string(), "ok".to_string()]
            })
        );
    }

    #[test]
    fn orders_columns_and_derives_key_flags() {
        let mut id = column(1, "id", "int4", false);
        id.identity_generation = Some("ALWAYS".to_string());
        let users = RawTable {
            name: "users".to_string(),
            columns: vec![
                column(3, "tenant", "int4", false),
                column(2, "email", "varchar", false),
                id,
            ],
            primary_key: Some(RawKey {
                name: "users_pkey".to_string(),
                columns: vec!["id".to_string()],
            }),
            unique_constraints: vec![
                RawKey {
                    name: "users_email_key".to_string(),
                    columns: vec!["email".to_string()],
                },
                RawKey {
                    name: "users_tenant_email_key".to_string(),
                    columns: vec!["tenant".to_string(), "email".to_string()],
                },
            ],
            foreign_keys: Vec::new(),
        };

        let snapshot = build_snapshot(catalog(vec![users])).expect("snapshot");
        let users = snapshot.table("users").expect("users");
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "tenant"]);

        let id = users.column("id").expect("id");
        assert!(id.is_primary_key && id.is_unique && id.is_generated);
        assert!(users.column("email").expect("email").is_unique);
        assert!(!users.column("tenant").expect("tenant").is_unique);
        assert_eq!(users.unique_constraints.len(), 2);
    }

    #[test]
    fn foreign_key_is_nullable_only_when_every_column_is() {
        let parent = RawTable {
            name: "parent".to_string(),
            columns: vec![column(1, "a", "int4", false), column(2, "b", "int4", false)],
            ..RawTable::default()
        };
        let child = RawTable {
            name: "child".to_string(),
            columns: vec![column(1, "a", "int4", true), column(2, "b", "int4", false)],
            foreign_keys: vec![
                fk("child_pair_fkey", &["a", "b"], "parent", &["a", "b"]),
                fk("child_a_fkey", &["a"], "parent", &["a"]),
            ],
            ..RawTable::default()
        };

        let snapshot = build_snapshot(catalog(vec![parent, child])).expect("snapshot");
        let keys = &snapshot.table("child").expect("child").foreign_keys;
        assert!(!keys[0].is_nullable);
        assert!(keys[1].is_nullable);
    }

    #[test]
    fn rejects_reference_outside_namespace() {
        let mut outside = fk("child_fkey", &["a"], "parent", &["a"]);
        outside.referenced_schema = "audit".to_string();
        let child = RawTable {
            name: "child".to_string(),
            columns: vec![column(1, "a", "int4", true)],
            foreign_keys: vec![outside],
            ..RawTable::default()
        };

        let err = build_snapshot(catalog(vec![child])).unwrap_err();
        assert!(matches!(err, Error::Introspection(_)));
        assert!(err.to_string().contains("audit.parent"));
    }

    #[test]
    fn rejects_duplicate_tables_and_missing_columns() {
        let table = RawTable {
            name: "t".to_string(),
            columns: vec![column(1, "a", "int4", true)],
            ..RawTable::default()
        };
        let err = build_snapshot(catalog(vec![table.clone(), table])).unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let broken = RawTable {
            name: "u".to_string(),
            columns: vec![column(1, "a", "int4", true)],
            primary_key: Some(RawKey {
                name: "u_pkey".to_string(),
                columns: vec!["missing".to_string()],
            }),
            ..RawTable::default()
        };
        let err = build_snapshot(catalog(vec![broken])).unwrap_err();
        assert!(matches!(err, Error::Introspection(_)));
        assert!(err.to_string().contains("missing"));
    }
}
