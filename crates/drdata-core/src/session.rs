use crate::cache::SchemaCache;
use crate::database::Database;

/// Collaborators for one invocation, passed explicitly to every component.
pub struct Session<'a> {
    pub database: &'a dyn Database,
    pub cache: &'a mut dyn SchemaCache,
    /// Identity of the configuration the cache entry belongs to.
    pub cache_key: String,
}

impl<'a> Session<'a> {
    pub fn new(
        database: &'a dyn Database,
        cache: &'a mut dyn SchemaCache,
        cache_key: impl Into<String>,
    ) -> Self {
        Self {
            database,
            cache,
            cache_key: cache_key.into(),
        }
    }
}
