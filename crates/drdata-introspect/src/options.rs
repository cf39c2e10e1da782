/// Options that control what the PostgreSQL collaborator reports.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Namespace (schema) whose tables are described.
    pub namespace: String,
    /// Report partitioned parent tables. Partitions themselves are never
    /// reported; rows are routed to them by the parent.
    pub include_partitioned_tables: bool,
    /// Upper bound on rows per `INSERT` statement.
    pub batch_size: usize,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            namespace: "public".to_string(),
            include_partitioned_tables: true,
            batch_size: 500,
        }
    }
}
