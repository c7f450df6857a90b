//! Schema definitions
//!
//! A [`SchemaDef`] is the immutable, ordered table of field descriptors for
//! one object type, plus its key-set policy:
//! - full (default): input keys must equal the declared field names
//! - partial: declared field names must all be present, extra keys are dropped
//!
//! Definitions are built once through [`SchemaBuilder`] and shared as
//! `Arc<SchemaDef>`; instances keep a handle to the definition they came from.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::field::{FieldDescriptor, FieldOptions};
use super::instance::Instance;
use super::types::TypeExpr;
use super::value::{Map, Value};
use crate::observability::{log_event_with_fields, Event};

/// Declarative contract for one object type
pub struct SchemaDef {
    name: String,
    partial: bool,
    fields: Vec<FieldDescriptor>,
    /// Field name to slot index
    index: HashMap<String, usize>,
}

impl SchemaDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Field descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::name)
    }

    pub(crate) fn slot_index(&self, name: &str) -> SchemaResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownField {
                schema: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Builds an instance from a dictionary.
    ///
    /// Every declared field is set in declaration order; the first failure
    /// aborts construction and no instance is returned.
    ///
    /// # Errors
    ///
    /// - `SchemaMismatch` if the key set violates the full/partial policy
    /// - any error raised while setting a field
    pub fn construct(self: &Arc<Self>, mut input: Map) -> SchemaResult<Instance> {
        let result = self.check_keys(&input).and_then(|()| {
            let mut instance = Instance::empty(Arc::clone(self));
            for (i, field) in self.fields.iter().enumerate() {
                let raw = input.remove(field.name()).unwrap_or(Value::Null);
                instance.set_slot(i, raw)?;
            }
            Ok(instance)
        });

        match &result {
            Ok(_) => {
                log_event_with_fields(Event::InstanceConstructed, &[("schema", self.name.as_str())])
            }
            Err(err) => log_event_with_fields(
                Event::ConstructionRejected,
                &[("schema", self.name.as_str()), ("code", err.code())],
            ),
        }
        result
    }

    /// Builds an instance from a value that must be a dictionary.
    pub fn from_value(self: &Arc<Self>, value: Value) -> SchemaResult<Instance> {
        match value {
            Value::Map(map) => self.construct(map),
            other => Err(SchemaError::NotAnObject {
                schema: self.name.clone(),
                found: other.kind_name(),
            }),
        }
    }

    /// Parses JSON text and builds an instance from it.
    ///
    /// Parser errors are returned unchanged as `SchemaError::Json`.
    pub fn from_json(self: &Arc<Self>, text: &str) -> SchemaResult<Instance> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        self.from_value(Value::from(json))
    }

    /// Checks whether `candidate` satisfies this schema without building it.
    ///
    /// Instances conform when they were built from this very definition.
    /// Dictionaries conform when their keys follow the full/partial policy and
    /// every declared entry type-matches after coercion. Validators are not
    /// run. Anything else does not conform.
    ///
    /// # Errors
    ///
    /// Only for defects in a field's type expression (ambiguous union,
    /// unsupported type); mismatches are `Ok(false)`.
    pub fn conforms_to(&self, candidate: &Value) -> SchemaResult<bool> {
        match candidate {
            Value::Instance(instance) => Ok(std::ptr::eq(Arc::as_ptr(instance.schema()), self)),
            Value::Map(map) => {
                if !self.partial && map.len() != self.fields.len() {
                    return Ok(false);
                }
                for field in &self.fields {
                    let Some(entry) = map.get(field.name()) else {
                        return Ok(false);
                    };
                    if !field.conforms(entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn check_keys(&self, input: &Map) -> SchemaResult<()> {
        let declared: BTreeSet<&str> = self.field_names().collect();
        let found: BTreeSet<&str> = input.keys().map(String::as_str).collect();

        let ok = if self.partial {
            declared.is_subset(&found)
        } else {
            declared == found
        };

        if ok {
            Ok(())
        } else {
            Err(SchemaError::SchemaMismatch {
                schema: self.name.clone(),
                partial: self.partial,
                declared: self.field_names().map(String::from).collect(),
                found: input.keys().cloned().collect(),
            })
        }
    }
}

impl fmt::Debug for SchemaDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDef")
            .field("name", &self.name)
            .field("partial", &self.partial)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`SchemaDef`]
///
/// ```
/// use dtoschema::schema::{FieldOptions, SchemaBuilder, TypeExpr};
///
/// let car = SchemaBuilder::new("Car")
///     .field_with(
///         "year",
///         TypeExpr::int(),
///         FieldOptions::new().validator(|v| v.as_int().is_some_and(|y| y > 1980)),
///     )
///     .field("license", TypeExpr::text())
///     .build()
///     .unwrap();
/// assert_eq!(car.fields().len(), 2);
/// ```
pub struct SchemaBuilder {
    name: String,
    partial: bool,
    fields: Vec<(String, TypeExpr, FieldOptions)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partial: false,
            fields: Vec::new(),
        }
    }

    /// Tolerate undeclared input keys
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Declares an immutable field with no validator or coercion
    pub fn field(self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.field_with(name, ty, FieldOptions::default())
    }

    pub fn field_with(mut self, name: impl Into<String>, ty: TypeExpr, options: FieldOptions) -> Self {
        self.fields.push((name.into(), ty, options));
        self
    }

    /// Validates the declaration and freezes it.
    ///
    /// # Errors
    ///
    /// `Declaration` if the schema name or a field name is empty, a field
    /// name is repeated, or a type expression is malformed.
    pub fn build(self) -> SchemaResult<Arc<SchemaDef>> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::declaration(self.name, "schema name must not be empty"));
        }

        let mut index = HashMap::with_capacity(self.fields.len());
        let mut fields = Vec::with_capacity(self.fields.len());

        for (i, (field_name, ty, options)) in self.fields.into_iter().enumerate() {
            if field_name.is_empty() {
                return Err(SchemaError::declaration(&self.name, "field name must not be empty"));
            }
            if index.insert(field_name.clone(), i).is_some() {
                return Err(SchemaError::declaration(
                    &self.name,
                    format!("field '{}' is declared more than once", field_name),
                ));
            }
            ty.check_structure().map_err(|reason| {
                SchemaError::declaration(&self.name, format!("field '{}': {}", field_name, reason))
            })?;
            fields.push(FieldDescriptor::new(&self.name, field_name, ty, options));
        }

        Ok(Arc::new(SchemaDef {
            name: self.name,
            partial: self.partial,
            fields,
            index,
        }))
    }
}
