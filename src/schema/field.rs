//! Field descriptors
//!
//! A descriptor owns the contract for one field: its type expression,
//! mutability, optional validator and optional coercion. Storage lives in a
//! [`FieldSlot`] on each instance; the descriptor only reads and writes it.
//!
//! Assignment order:
//! 1. coerce the raw value
//! 2. reject reassignment of an initialized immutable field
//! 3. resolve the type (nested dictionaries become instances)
//! 4. null values are stored without running the validator
//! 5. run the validator
//! 6. store and mark initialized

use std::fmt;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::matcher::{match_type, Resolved};
use super::types::TypeExpr;
use super::value::Value;

/// Predicate over a coerced, type-checked value
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Transform applied to raw input before type checking
pub type Coercion = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Per-field options
#[derive(Clone)]
pub struct FieldOptions {
    pub immutable: bool,
    pub validator: Option<Validator>,
    pub coerce: Option<Coercion>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            immutable: true,
            validator: None,
            coerce: None,
        }
    }
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow reassignment after the first set
    pub fn mutable(mut self) -> Self {
        self.immutable = false;
        self
    }

    pub fn validator(mut self, validator: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn coerce(mut self, coerce: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.coerce = Some(Arc::new(coerce));
        self
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("immutable", &self.immutable)
            .field("validator", &self.validator.is_some())
            .field("coerce", &self.coerce.is_some())
            .finish()
    }
}

/// Storage for one field on one instance
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FieldSlot {
    value: Option<Value>,
}

impl FieldSlot {
    pub(crate) fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Runtime contract for a single declared field
pub struct FieldDescriptor {
    schema_name: String,
    name: String,
    ty: TypeExpr,
    options: FieldOptions,
}

impl FieldDescriptor {
    pub(crate) fn new(
        schema_name: impl Into<String>,
        name: impl Into<String>,
        ty: TypeExpr,
        options: FieldOptions,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            name: name.into(),
            ty,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn type_expr(&self) -> &TypeExpr {
        &self.ty
    }

    pub fn is_immutable(&self) -> bool {
        self.options.immutable
    }

    pub fn has_validator(&self) -> bool {
        self.options.validator.is_some()
    }

    pub fn has_coercion(&self) -> bool {
        self.options.coerce.is_some()
    }

    fn coerce(&self, raw: Value) -> Value {
        match &self.options.coerce {
            Some(coerce) => coerce(raw),
            None => raw,
        }
    }

    /// Reads the stored value.
    pub(crate) fn get<'s>(&self, slot: &'s FieldSlot) -> SchemaResult<&'s Value> {
        slot.value().ok_or_else(|| SchemaError::UninitializedField {
            schema: self.schema_name.clone(),
            field: self.name.clone(),
        })
    }

    /// Coerces, checks and stores `raw`. On error the slot is left untouched.
    pub(crate) fn set(&self, slot: &mut FieldSlot, raw: Value) -> SchemaResult<()> {
        let value = self.coerce(raw);

        if self.options.immutable && slot.is_initialized() {
            return Err(SchemaError::ImmutableField {
                schema: self.schema_name.clone(),
                field: self.name.clone(),
            });
        }

        let resolved = match_type(&self.ty, &value)?.ok_or_else(|| SchemaError::TypeMismatch {
            schema: self.schema_name.clone(),
            field: self.name.clone(),
            expected: self.ty.to_string(),
            value: value.to_string(),
        })?;

        if resolved.is_null() {
            slot.value = Some(Value::Null);
            return Ok(());
        }

        let value = materialize(&self.ty, value)?;

        if let Some(validator) = &self.options.validator {
            if !validator(&value) {
                return Err(SchemaError::Validation {
                    schema: self.schema_name.clone(),
                    field: self.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        slot.value = Some(value);
        Ok(())
    }

    /// Checks whether `raw` would pass coercion and type checking.
    ///
    /// Validators are not run.
    pub(crate) fn conforms(&self, raw: &Value) -> SchemaResult<bool> {
        let value = self.coerce(raw.clone());
        Ok(match_type(&self.ty, &value)?.is_some())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("schema", &self.schema_name)
            .field("name", &self.name)
            .field("type", &self.ty.to_string())
            .field("options", &self.options)
            .finish()
    }
}

/// Instantiates every dictionary that resolved to a nested schema.
///
/// `value` must already match `ty`.
fn materialize(ty: &TypeExpr, value: Value) -> SchemaResult<Value> {
    match (ty, value) {
        (TypeExpr::SchemaRef(schema), Value::Map(map)) => {
            Ok(Value::Instance(schema.construct(map)?))
        }
        (TypeExpr::Nullable(inner), value) => {
            if value.is_null() {
                Ok(value)
            } else {
                materialize(inner, value)
            }
        }
        (TypeExpr::Union(_), value) => {
            let branch = match match_type(ty, &value)? {
                Some(Resolved::Type(branch)) => branch,
                _ => return Ok(value),
            };
            materialize(branch, value)
        }
        (TypeExpr::SeqOf(element_type), Value::Seq(items)) => Ok(Value::Seq(
            items
                .into_iter()
                .map(|item| materialize(element_type, item))
                .collect::<SchemaResult<_>>()?,
        )),
        (TypeExpr::MapOf(_, value_type), Value::Map(map)) => Ok(Value::Map(
            map.into_iter()
                .map(|(k, v)| Ok((k, materialize(value_type, v)?)))
                .collect::<SchemaResult<_>>()?,
        )),
        (_, value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn descriptor(ty: TypeExpr, options: FieldOptions) -> FieldDescriptor {
        FieldDescriptor::new("SimpleDto", "attribute", ty, options)
    }

    #[test]
    fn test_read_before_set_fails() {
        let field = descriptor(TypeExpr::int(), FieldOptions::new());
        let slot = FieldSlot::default();
        let err = field.get(&slot).unwrap_err();
        assert_eq!(err.code(), "DTO_FIELD_UNINITIALIZED");
    }

    #[test]
    fn test_set_then_get() {
        let field = descriptor(TypeExpr::int(), FieldOptions::new());
        let mut slot = FieldSlot::default();
        field.set(&mut slot, Value::Int(1)).unwrap();
        assert!(slot.is_initialized());
        assert_eq!(field.get(&slot).unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_immutable_rejects_second_set() {
        let field = descriptor(TypeExpr::int(), FieldOptions::new());
        let mut slot = FieldSlot::default();
        field.set(&mut slot, Value::Int(1)).unwrap();

        let err = field.set(&mut slot, Value::Int(2)).unwrap_err();
        assert!(matches!(err, SchemaError::ImmutableField { .. }));
        assert_eq!(field.get(&slot).unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_mutable_still_type_checks() {
        let field = descriptor(TypeExpr::real(), FieldOptions::new().mutable());
        let mut slot = FieldSlot::default();
        field.set(&mut slot, Value::Real(1.0)).unwrap();

        let err = field.set(&mut slot, Value::Int(2)).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
        assert_eq!(field.get(&slot).unwrap(), &Value::Real(1.0));

        field.set(&mut slot, Value::Real(2.0)).unwrap();
        assert_eq!(field.get(&slot).unwrap(), &Value::Real(2.0));
    }

    #[test]
    fn test_failed_validation_leaves_slot_uninitialized() {
        let field = descriptor(
            TypeExpr::real(),
            FieldOptions::new().validator(|v| v.as_real().is_some_and(|r| r > 0.0)),
        );
        let mut slot = FieldSlot::default();
        let err = field.set(&mut slot, Value::Real(0.0)).unwrap_err();
        assert!(matches!(err, SchemaError::Validation { .. }));
        assert!(!slot.is_initialized());
    }

    #[test]
    fn test_null_skips_validator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let field = descriptor(
            TypeExpr::optional(TypeExpr::real()),
            FieldOptions::new().validator(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }),
        );
        let mut slot = FieldSlot::default();
        field.set(&mut slot, Value::Null).unwrap();
        assert_eq!(field.get(&slot).unwrap(), &Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_coercion_runs_before_type_check() {
        let field = descriptor(
            TypeExpr::int(),
            FieldOptions::new().coerce(|raw| match raw {
                Value::Text(s) => s.parse::<i64>().map(Value::Int).unwrap_or(Value::Text(s)),
                other => other,
            }),
        );
        let mut slot = FieldSlot::default();
        field.set(&mut slot, Value::from("42")).unwrap();
        assert_eq!(field.get(&slot).unwrap(), &Value::Int(42));

        let mut slot = FieldSlot::default();
        let err = field.set(&mut slot, Value::from("forty-two")).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_conforms_applies_coercion_but_not_validator() {
        let field = descriptor(
            TypeExpr::real(),
            FieldOptions::new()
                .coerce(|raw| match raw {
                    Value::Int(i) => Value::Real(i as f64),
                    other => other,
                })
                .validator(|_| false),
        );
        assert!(field.conforms(&Value::Int(3)).unwrap());
        assert!(!field.conforms(&Value::from("3")).unwrap());
    }
}
