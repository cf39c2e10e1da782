use std::collections::HashMap;

use crate::artifact::SchemaArtifact;

/// Store for schema artifacts keyed by configuration identity.
///
/// Purely an optimisation: a miss always falls back to introspection.
pub trait SchemaCache: Send {
    fn get(&self, key: &str) -> Option<SchemaArtifact>;
    fn put(&mut self, key: &str, artifact: SchemaArtifact);
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, SchemaArtifact>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SchemaCache for MemoryCache {
    fn get(&self, key: &str) -> Option<SchemaArtifact> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, artifact: SchemaArtifact) {
        self.entries.insert(key.to_string(), artifact);
    }
}
