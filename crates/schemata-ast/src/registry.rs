//! Named schema registry

use crate::ast::Ast;
use dashmap::DashMap;
use tracing::trace;

/// Thread-safe map of schema names to schemas
///
/// Loaded documents register their definitions here; `ref` nodes resolve
/// against it on first use.
pub struct SchemaRegistry {
    schemas: DashMap<String, Ast>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }

    /// Register a schema, replacing any previous one with the same name
    pub fn register(&self, name: impl Into<String>, schema: Ast) {
        let name = name.into();
        trace!("Registering schema: {}", name);
        self.schemas.insert(name, schema);
    }

    /// Get a schema by name
    pub fn get(&self, name: &str) -> Option<Ast> {
        self.schemas.get(name).map(|entry| entry.value().clone())
    }

    /// Check if a schema exists
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
