use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use drdata_core::{
    Column, ForeignKey, IntegerWidth, MemoryDatabase, RawCatalog, SchemaArtifact, SchemaSnapshot,
    SemanticType, Table, TextKind, Value,
};
use drdata_load::{CsvLoader, CsvOptions, LoadError, plan_directory};

fn column(name: &str, semantic_type: SemanticType, nullable: bool) -> Column {
    Column {
        ordinal_position: 1,
        name: name.to_string(),
        declared_type: semantic_type.label(),
        semantic_type,
        is_nullable: nullable,
        default: None,
        max_length: None,
        numeric_precision: None,
        numeric_scale: None,
        is_unique: false,
        is_primary_key: false,
        is_generated: false,
    }
}

fn int(name: &str) -> Column {
    column(
        name,
        SemanticType::Integer {
            width: IntegerWidth::Regular,
        },
        false,
    )
}

fn text(name: &str, nullable: bool) -> Column {
    column(
        name,
        SemanticType::Text {
            text: TextKind::Plain,
        },
        nullable,
    )
}

fn shop() -> SchemaArtifact {
    let mut id = int("id");
    id.is_primary_key = true;
    let mut serial = int("serial");
    serial.is_generated = true;

    let customers = Table {
        name: "customers".to_string(),
        columns: vec![id.clone(), text("name", false), text("nickname", true), serial],
        primary_key: vec!["id".to_string()],
        unique_constraints: Vec::new(),
        foreign_keys: Vec::new(),
    };
    let orders = Table {
        name: "orders".to_string(),
        columns: vec![id, int("customer_id")],
        primary_key: vec!["id".to_string()],
        unique_constraints: Vec::new(),
        foreign_keys: vec![ForeignKey {
            name: None,
            columns: vec!["customer_id".to_string()],
            referenced_table: "customers".to_string(),
            referenced_columns: vec!["id".to_string()],
            is_nullable: false,
        }],
    };

    SchemaArtifact::from_snapshot(SchemaSnapshot {
        engine: "memory".to_string(),
        database: Some("shop".to_string()),
        namespace: "public".to_string(),
        tables: BTreeMap::from([
            ("customers".to_string(), customers),
            ("orders".to_string(), orders),
        ]),
    })
    .expect("artifact")
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[tokio::test]
async fn directory_example_loads_matches_and_reports_the_rest() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "customers.csv", "id,name\n1,Ada\n2,Grace\n");
    let widgets = write(dir.path(), "widgets.csv", "id\n1\n");
    write(dir.path(), "notes.txt", "ignored");

    let artifact = shop();
    let database = MemoryDatabase::new(RawCatalog::default());
    let report = CsvLoader::new(&database, CsvOptions::default())
        .load_directory(&artifact, dir.path())
        .await
        .expect("load");

    assert_eq!(report.loaded.len(), 1);
    assert_eq!(report.loaded[0].table, "customers");
    assert_eq!(report.loaded[0].rows, 2);
    assert_eq!(report.skipped, vec!["orders"]);
    assert_eq!(report.unmatched, vec![widgets]);
    assert_eq!(database.write_log(), vec!["customers"]);
    assert_eq!(
        database.column_values("customers", "name"),
        vec![Value::Text("Ada".into()), Value::Text("Grace".into())]
    );
}

#[tokio::test]
async fn directory_tables_load_in_insertion_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "orders.csv", "id,customer_id\n10,1\n");
    write(dir.path(), "customers.csv", "id,name\n1,Ada\n");

    let plan = plan_directory(&shop(), dir.path()).expect("plan");
    let tables: Vec<&str> = plan.matched.iter().map(|(table, _)| table.as_str()).collect();
    assert_eq!(tables, vec!["customers", "orders"]);

    let database = MemoryDatabase::new(RawCatalog::default());
    CsvLoader::new(&database, CsvOptions::default())
        .load_directory(&shop(), dir.path())
        .await
        .expect("load");
    assert_eq!(database.write_log(), vec!["customers", "orders"]);
}

#[tokio::test]
async fn failure_keeps_tables_loaded_before_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "customers.csv", "id,name\n1,Ada\n");
    write(dir.path(), "orders.csv", "id,customer_id\n10,99\n");

    let database = MemoryDatabase::new(RawCatalog::default());
    let err = CsvLoader::new(&database, CsvOptions::default())
        .load_directory(&shop(), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoadError::Core(drdata_core::Error::Database { ref table, .. }) if table == "orders"
    ));
    assert_eq!(database.row_count("customers"), 1);
    assert_eq!(database.row_count("orders"), 0);
}

#[tokio::test]
async fn single_file_checks_table_and_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = write(dir.path(), "people.csv", "id,name\n1,Ada\n");
    let txt = write(dir.path(), "people.txt", "id,name\n1,Ada\n");
    let artifact = shop();
    let database = MemoryDatabase::new(RawCatalog::default());
    let loader = CsvLoader::new(&database, CsvOptions::default());

    let err = loader
        .load_file(&artifact.schema, &csv, "people")
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::UnknownTable(ref table) if table == "people"));

    let err = loader
        .load_file(&artifact.schema, &txt, "customers")
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::NotCsv(_)));

    let load = loader
        .load_file(&artifact.schema, &csv, "customers")
        .await
        .expect("load");
    assert_eq!(load.rows, 1);
}

#[tokio::test]
async fn header_must_name_writable_columns_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let artifact = shop();
    let database = MemoryDatabase::new(RawCatalog::default());
    let loader = CsvLoader::new(&database, CsvOptions::default());

    let unknown = write(dir.path(), "a.csv", "id,name,shoe_size,age\n1,Ada,38,36\n");
    match loader.load_file(&artifact.schema, &unknown, "customers").await {
        Err(LoadError::SchemaMismatch { table, columns }) => {
            assert_eq!(table, "customers");
            assert_eq!(columns, vec!["shoe_size", "age"]);
        }
        other => panic!("unexpected {other:?}"),
    }

    let duplicate = write(dir.path(), "b.csv", "id,name,id\n1,Ada,1\n");
    assert!(matches!(
        loader.load_file(&artifact.schema, &duplicate, "customers").await,
        Err(LoadError::DuplicateColumn { .. })
    ));

    let generated = write(dir.path(), "c.csv", "id,name,serial\n1,Ada,5\n");
    assert!(matches!(
        loader.load_file(&artifact.schema, &generated, "customers").await,
        Err(LoadError::GeneratedColumn { ref column, .. }) if column == "serial"
    ));

    assert!(database.write_log().is_empty());
}

#[tokio::test]
async fn coercion_errors_name_row_and_value_and_write_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "customers.csv", "id,name\n1,Ada\nx2,Grace\n");
    let artifact = shop();
    let database = MemoryDatabase::new(RawCatalog::default());

    let err = CsvLoader::new(&database, CsvOptions::default())
        .load_file(&artifact.schema, &path, "customers")
        .await
        .unwrap_err();

    match err {
        LoadError::TypeCoercion {
            table,
            column,
            row,
            value,
            expected,
        } => {
            assert_eq!(table, "customers");
            assert_eq!(column, "id");
            assert_eq!(row, 2);
            assert_eq!(value, "x2");
            assert_eq!(expected, "integer");
        }
        other => panic!("unexpected {other}"),
    }
    assert_eq!(database.row_count("customers"), 0);
}

#[tokio::test]
async fn empty_fields_and_custom_delimiter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "customers.csv", "id;name;nickname\n1;;\n");
    let artifact = shop();
    let database = MemoryDatabase::new(RawCatalog::default());

    CsvLoader::new(&database, CsvOptions { delimiter: b';' })
        .load_file(&artifact.schema, &path, "customers")
        .await
        .expect("load");

    assert_eq!(
        database.column_values("customers", "name"),
        vec![Value::Text(String::new())]
    );
    assert_eq!(
        database.column_values("customers", "nickname"),
        vec![Value::Null]
    );
}

#[tokio::test]
async fn files_differing_only_in_extension_case_conflict() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "customers.csv", "id,name\n1,Ada\n");
    write(dir.path(), "customers.CSV", "id,name\n2,Grace\n");
    write(dir.path(), "widgets.csv", "id\n1\n");
    write(dir.path(), "widgets.CSV", "id\n2\n");

    let err = plan_directory(&shop(), dir.path()).unwrap_err();
    match err {
        LoadError::AmbiguousFiles { table, files } => {
            assert_eq!(table, "customers");
            assert_eq!(files.len(), 2);
        }
        other => panic!("unexpected {other}"),
    }

    let database = MemoryDatabase::new(RawCatalog::default());
    let result = CsvLoader::new(&database, CsvOptions::default())
        .load_directory(&shop(), dir.path())
        .await;
    assert!(matches!(result, Err(LoadError::AmbiguousFiles { .. })));
    assert!(database.write_log().is_empty());
}

#[test]
fn unmatched_files_sharing_a_name_are_all_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "widgets.csv", "id\n1\n");
    write(dir.path(), "widgets.CSV", "id\n2\n");

    let plan = plan_directory(&shop(), dir.path()).expect("plan");
    assert!(plan.matched.is_empty());
    assert_eq!(plan.unmatched.len(), 2);
}
