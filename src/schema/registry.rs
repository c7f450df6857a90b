//! Schema registry
//!
//! Named lookup of schema definitions. A name can be registered once;
//! definitions are immutable after registration.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::definition::SchemaDef;
use super::errors::{SchemaError, SchemaResult};
use super::instance::Instance;
use super::value::Value;
use crate::observability::{log_event_with_fields, Event};

/// In-memory table of schema definitions, keyed by schema name
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<SchemaDef>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its own name.
    ///
    /// # Errors
    ///
    /// `Declaration` if a schema with the same name is already registered.
    pub fn register(&mut self, schema: Arc<SchemaDef>) -> SchemaResult<()> {
        let name = schema.name().to_string();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::declaration(
                name,
                "a schema with this name is already registered",
            ));
        }

        let field_count = schema.fields().len().to_string();
        log_event_with_fields(
            Event::SchemaRegistered,
            &[("schema", name.as_str()), ("fields", field_count.as_str())],
        );
        self.schemas.insert(name, schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<SchemaDef>> {
        self.schemas.get(name)
    }

    /// Gets a schema or fails with `UnknownSchema`.
    pub fn require(&self, name: &str) -> SchemaResult<&Arc<SchemaDef>> {
        self.get(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns all schemas ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SchemaDef>> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Builds an instance of the named schema from a dictionary value.
    pub fn construct(&self, name: &str, value: Value) -> SchemaResult<Instance> {
        self.require(name)?.from_value(value)
    }

    /// Builds an instance of the named schema from JSON text.
    pub fn from_json(&self, name: &str, text: &str) -> SchemaResult<Instance> {
        self.require(name)?.from_json(text)
    }

    /// Checks whether `candidate` conforms to the named schema.
    pub fn conforms_to(&self, name: &str, candidate: &Value) -> SchemaResult<bool> {
        self.require(name)?.conforms_to(candidate)
    }
}
