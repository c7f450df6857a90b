//! Schema instances
//!
//! An instance holds one slot per declared field, in declaration order. Field
//! access goes through the definition's name table to the field's descriptor,
//! so immutability, type checks and validators apply to every write.

use std::fmt;
use std::sync::Arc;

use super::definition::SchemaDef;
use super::errors::SchemaResult;
use super::field::FieldSlot;
use super::value::{Map, Value};

/// A validated object built from a [`SchemaDef`]
#[derive(Clone)]
pub struct Instance {
    schema: Arc<SchemaDef>,
    slots: Vec<FieldSlot>,
}

impl Instance {
    /// Creates an instance with every field uninitialized.
    ///
    /// Only construction sees this state.
    pub(crate) fn empty(schema: Arc<SchemaDef>) -> Self {
        let slots = vec![FieldSlot::default(); schema.fields().len()];
        Self { schema, slots }
    }

    pub(crate) fn set_slot(&mut self, index: usize, raw: Value) -> SchemaResult<()> {
        self.schema.fields()[index].set(&mut self.slots[index], raw)
    }

    /// The definition this instance was built from
    pub fn schema(&self) -> &Arc<SchemaDef> {
        &self.schema
    }

    pub fn schema_name(&self) -> &str {
        self.schema.name()
    }

    /// Reads a field.
    ///
    /// # Errors
    ///
    /// `UnknownField` for undeclared names, `UninitializedField` if the field
    /// was never set.
    pub fn get(&self, field: &str) -> SchemaResult<&Value> {
        let index = self.schema.slot_index(field)?;
        self.schema.fields()[index].get(&self.slots[index])
    }

    /// Assigns a field through its descriptor.
    ///
    /// # Errors
    ///
    /// `ImmutableField` when reassigning an immutable field, otherwise the
    /// same errors as construction. The stored value is unchanged on error.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> SchemaResult<()> {
        let index = self.schema.slot_index(field)?;
        self.set_slot(index, value.into())
    }

    pub fn is_initialized(&self, field: &str) -> bool {
        self.schema
            .slot_index(field)
            .map(|index| self.slots[index].is_initialized())
            .unwrap_or(false)
    }

    /// Initialized fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.slots)
            .filter_map(|(field, slot)| slot.value().map(|value| (field.name(), value)))
    }

    /// Serializes into a plain dictionary, flattening nested instances.
    pub fn to_dict(&self) -> Map {
        self.fields()
            .map(|(name, value)| (name.to_string(), value.to_plain()))
            .collect()
    }

    /// Serializes into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect(),
        )
    }
}

impl PartialEq for Instance {
    /// Equal when built from the same definition with equal field values.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.slots == other.slots
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.schema.name())?;
        for (i, (name, value)) in self.fields().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", name, value)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.fields() {
            map.entry(&name, value);
        }
        map.finish()
    }
}
