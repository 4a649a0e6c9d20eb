//! Table registry.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::Schema;

/// Schemas keyed by table name.
///
/// Populated once at startup, read-only afterwards. Iteration follows table
/// name order so generated scripts are stable.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: BTreeMap<String, Schema>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaDefinition`] if the table name is already registered.
    pub fn register(&mut self, schema: Schema) -> Result<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(Error::schema(format!(
                "table '{}' is already registered",
                schema.name()
            )));
        }
        tracing::debug!(table = schema.name(), "Registered schema");
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Looks a schema up by table name.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<&Schema> {
        self.schemas.get(table)
    }

    /// All schemas in table name order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Schemas that correspond to real tables.
    pub fn migratable(&self) -> impl Iterator<Item = &Schema> {
        self.iter().filter(|s| !s.is_abstracted())
    }

    /// Number of registered schemas, abstract ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
