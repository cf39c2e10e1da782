use drdata_core::{
    Database, DependencyResolver, Error, Result, SchemaArtifact, SchemaSnapshot, Session,
};
use tracing::{debug, info};

use crate::mapper::build_snapshot;

/// Reads metadata through a [`Database`] and produces a validated snapshot.
pub struct SchemaIntrospector<'a> {
    database: &'a dyn Database,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(database: &'a dyn Database) -> Self {
        Self { database }
    }

    pub async fn introspect(&self) -> Result<SchemaSnapshot> {
        let catalog = self.database.describe_schema().await.map_err(|err| {
            Error::Introspection(format!(
                "describing {} schema failed: {err}",
                self.database.engine()
            ))
        })?;

        let snapshot = build_snapshot(catalog)?;
        info!(
            event = "schema_introspected",
            engine = %snapshot.engine,
            namespace = %snapshot.namespace,
            tables = snapshot.tables.len(),
        );
        Ok(snapshot)
    }
}

/// Return the session's schema artifact, introspecting on a cache miss.
pub async fn load_artifact(session: &mut Session<'_>) -> Result<SchemaArtifact> {
    if let Some(artifact) = session.cache.get(&session.cache_key) {
        debug!(event = "schema_cache_hit", key = %session.cache_key);
        return Ok(artifact);
    }

    let snapshot = SchemaIntrospector::new(session.database).introspect().await?;
    let summary = DependencyResolver::new(&snapshot).summary();
    info!(
        event = "dependency_graph_built",
        nodes = summary.nodes,
        edges = summary.edges,
    );

    let artifact = SchemaArtifact::from_snapshot(snapshot)?;
    session.cache.put(&session.cache_key, artifact.clone());
    Ok(artifact)
}
