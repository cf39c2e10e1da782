use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

use drdata_core::{
    Database, DatabaseError, DbErrorKind, RawCatalog, RawColumn, RawEnum, RawForeignKey, RawKey,
    RawTable, RowBatch, Table, Value,
};

use crate::options::IntrospectOptions;

mod queries;
mod utils;

use utils::{classify_sqlx_error, qualified_name, quote_ident, rows_per_statement};

/// [`Database`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    options: IntrospectOptions,
}

impl PostgresDatabase {
    /// Create a collaborator over a pre-configured pool.
    pub fn new(pool: PgPool, options: IntrospectOptions) -> Self {
        Self { pool, options }
    }

    pub fn namespace(&self) -> &str {
        &self.options.namespace
    }

    async fn describe(&self) -> Result<RawCatalog, sqlx::Error> {
        let pool = &self.pool;
        let namespace = self.options.namespace.as_str();

        let database = queries::fetch_database_name(pool).await?;
        let enums = queries::list_enums(pool)
            .await?
            .into_iter()
            .map(|row| RawEnum {
                schema: row.schema,
                name: row.name,
                labels: row.labels,
            })
            .collect();

        let mut tables = Vec::new();
        for name in
            queries::list_tables(pool, namespace, self.options.include_partitioned_tables).await?
        {
            let columns = queries::list_columns(pool, namespace, &name)
                .await?
                .into_iter()
                .map(|row| RawColumn {
                    ordinal_position: row.ordinal_position,
                    name: row.name,
                    data_type: row.data_type,
                    udt_schema: row.udt_schema,
                    udt_name: row.udt_name,
                    is_nullable: row.is_nullable,
                    default: row.column_default,
                    identity_generation: row.identity_generation,
                    is_generated: row.is_generated,
                    character_max_length: row.character_max_length,
                    numeric_precision: row.numeric_precision,
                    numeric_scale: row.numeric_scale,
                })
                .collect();

            let mut primary_key = None;
            let mut unique_constraints = Vec::new();
            for row in queries::list_keys(pool, namespace, &name).await? {
                let key = RawKey {
                    name: row.name,
                    columns: row.columns,
                };
                if row.kind == "p" {
                    primary_key = Some(key);
                } else {
                    unique_constraints.push(key);
                }
            }

            let foreign_keys = queries::list_foreign_keys(pool, namespace, &name)
                .await?
                .into_iter()
                .map(|row| RawForeignKey {
                    name: row.name,
                    columns: row.columns,
                    referenced_schema: row.referenced_schema,
                    referenced_table: row.referenced_table,
                    referenced_columns: row.referenced_columns,
                })
                .collect();

            tables.push(RawTable {
                name,
                columns,
                primary_key,
                unique_constraints,
                foreign_keys,
            });
        }

        Ok(RawCatalog {
            engine: "postgres".to_string(),
            database: Some(database),
            namespace: namespace.to_string(),
            tables,
            enums,
        })
    }

    /// Insert `batch` in one transaction. Returns the row count and, when
    /// `returning` is non-empty, those columns of every inserted row.
    async fn insert(
        &self,
        table: &Table,
        batch: &RowBatch,
        returning: &[String],
    ) -> Result<(u64, Vec<Vec<Value>>), DatabaseError> {
        let target = qualified_name(&self.options.namespace, &table.name);
        let casts = batch
            .columns
            .iter()
            .map(|name| {
                table
                    .column(name)
                    .map(|column| format!("::text::{}", column.declared_type))
                    .ok_or_else(|| {
                        DatabaseError::new(
                            DbErrorKind::Syntax,
                            format!("column '{name}' does not exist on '{}'", table.name),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let suffix = returning_clause(returning);

        let mut tx = self.pool.begin().await.map_err(classify_sqlx_error)?;
        let mut written = 0;
        let mut keys = Vec::new();

        if batch.columns.is_empty() {
            let sql = format!("insert into {target} default values{suffix}");
            for _ in &batch.rows {
                written += run_insert(sqlx::query(&sql), &mut *tx, returning.len(), &mut keys)
                    .await
                    .map_err(classify_sqlx_error)?;
            }
        } else {
            let column_list = batch
                .columns
                .iter()
                .map(|name| quote_ident(name))
                .collect::<Vec<_>>()
                .join(", ");
            let chunk_rows = rows_per_statement(self.options.batch_size, batch.columns.len());

            for chunk in batch.rows.chunks(chunk_rows) {
                let mut builder =
                    QueryBuilder::<Postgres>::new(format!("insert into {target} ({column_list}) "));
                builder.push_values(chunk, |mut tuple, row| {
                    for (value, cast) in row.iter().zip(&casts) {
                        tuple.push_bind(value.to_sql_text());
                        tuple.push_unseparated(cast);
                    }
                });
                builder.push(&suffix);
                written += run_insert(builder.build(), &mut *tx, returning.len(), &mut keys)
                    .await
                    .map_err(classify_sqlx_error)?;
                debug!(
                    event = "insert_chunk",
                    table = %table.name,
                    rows = chunk.len(),
                );
            }
        }

        tx.commit().await.map_err(classify_sqlx_error)?;
        Ok((written, keys))
    }
}

/// ` returning "a"::text, ..` or nothing.
fn returning_clause(returning: &[String]) -> String {
    if returning.is_empty() {
        return String::new();
    }
    let columns = returning
        .iter()
        .map(|name| format!("{}::text", quote_ident(name)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" returning {columns}")
}

async fn run_insert(
    query: Query<'_, Postgres, PgArguments>,
    conn: &mut PgConnection,
    width: usize,
    keys: &mut Vec<Vec<Value>>,
) -> Result<u64, sqlx::Error> {
    if width == 0 {
        return Ok(query.execute(conn).await?.rows_affected());
    }
    let rows = query.fetch_all(conn).await?;
    for row in &rows {
        let values = (0..width)
            .map(|index| {
                row.try_get::<Option<String>, _>(index)
                    .map(|value| value.map(Value::Text).unwrap_or(Value::Null))
            })
            .collect::<Result<Vec<_>, _>>()?;
        keys.push(values);
    }
    Ok(rows.len() as u64)
}

#[async_trait]
impl Database for PostgresDatabase {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn describe_schema(&self) -> Result<RawCatalog, DatabaseError> {
        self.describe().await.map_err(classify_sqlx_error)
    }

    async fn execute_write(&self, table: &Table, batch: &RowBatch) -> Result<u64, DatabaseError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let (written, _) = self.insert(table, batch, &[]).await?;
        Ok(written)
    }

    async fn insert_returning(
        &self,
        table: &Table,
        batch: &RowBatch,
        returning: &[String],
    ) -> Result<Vec<Vec<Value>>, DatabaseError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let (_, keys) = self.insert(table, batch, returning).await?;
        Ok(keys)
    }

    async fn truncate(&self, table: &str) -> Result<(), DatabaseError> {
        let sql = format!(
            "truncate table {} cascade",
            qualified_name(&self.options.namespace, table)
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(())
    }
}
