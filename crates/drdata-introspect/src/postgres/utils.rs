use drdata_core::{DatabaseError, DbErrorKind};

/// PostgreSQL's limit on bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified_name(namespace: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(namespace), quote_ident(table))
}

/// Rows per `INSERT` so the statement stays under [`MAX_BIND_PARAMS`].
pub fn rows_per_statement(batch_size: usize, columns: usize) -> usize {
    let by_params = MAX_BIND_PARAMS / columns.max(1);
    batch_size.min(by_params).max(1)
}

/// Classify by SQLSTATE class; transport failures count as connectivity.
pub fn classify_sqlx_error(err: sqlx::Error) -> DatabaseError {
    let kind = match &err {
        sqlx::Error::Database(db) => db
            .code()
            .as_deref()
            .and_then(|code| code.get(..2))
            .map(sqlstate_kind)
            .unwrap_or(DbErrorKind::Other),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DbErrorKind::Connectivity,
        _ => DbErrorKind::Other,
    };
    DatabaseError::new(kind, err.to_string())
}

fn sqlstate_kind(class: &str) -> DbErrorKind {
    match class {
        "08" | "57" => DbErrorKind::Connectivity,
        "23" => DbErrorKind::Constraint,
        "42" => DbErrorKind::Syntax,
        _ => DbErrorKind::Other,
    }
}
