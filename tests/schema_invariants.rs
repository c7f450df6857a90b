//! Schema Invariant Tests
//!
//! Properties that hold for every schema and input:
//! - Construction is all or nothing and deterministic
//! - Construction output round-trips through `to_dict`
//! - Immutable fields cannot be reassigned
//! - Union members are mutually exclusive
//! - Null values never reach validators
//! - Equality requires the same definition

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dtoschema::schema::{
    FieldOptions, SchemaBuilder, SchemaDef, SchemaError, SchemaRegistry, TypeExpr, Value,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn dict(body: serde_json::Value) -> Value {
    Value::from(body)
}

fn simple_schema(name: &str) -> Arc<SchemaDef> {
    SchemaBuilder::new(name)
        .field("attribute1", TypeExpr::real())
        .field("attribute2", TypeExpr::int())
        .build()
        .unwrap()
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// Same input constructs the same way every time.
#[test]
fn test_construction_is_deterministic() {
    let schema = simple_schema("Simple");
    let input = dict(json!({"attribute1": 1.0, "attribute2": 2}));

    let first = schema.from_value(input.clone()).unwrap();
    for _ in 0..100 {
        assert_eq!(schema.from_value(input.clone()).unwrap(), first);
    }
}

/// Invalid input fails the same way every time.
#[test]
fn test_rejection_is_deterministic() {
    let schema = simple_schema("Simple");
    let input = dict(json!({"attribute1": 1, "attribute2": 2}));

    for _ in 0..100 {
        let err = schema.from_value(input.clone()).unwrap_err();
        assert_eq!(err.code(), "DTO_TYPE_MISMATCH");
    }
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

/// Constructing from `to_dict` yields an equal instance.
#[test]
fn test_to_dict_round_trip() {
    let address = SchemaBuilder::new("Address")
        .field("city", TypeExpr::text())
        .build()
        .unwrap();
    let user = SchemaBuilder::new("User")
        .field("name", TypeExpr::text())
        .field("address", TypeExpr::schema(&address))
        .field("tags", TypeExpr::seq_of(TypeExpr::text()))
        .field("salary", TypeExpr::optional(TypeExpr::real()))
        .build()
        .unwrap();

    let original = user
        .from_value(dict(json!({
            "name": "pam",
            "address": {"city": "scranton"},
            "tags": ["art", "reception"],
            "salary": null
        })))
        .unwrap();

    let rebuilt = user.construct(original.to_dict()).unwrap();
    assert_eq!(rebuilt, original);
}

// =============================================================================
// Immutability Tests
// =============================================================================

/// An immutable field keeps its first value; the failed write changes nothing.
#[test]
fn test_immutable_field_rejects_reassignment() {
    let schema = simple_schema("Simple");
    let mut simple = schema
        .from_value(dict(json!({"attribute1": 1.0, "attribute2": 2})))
        .unwrap();

    for value in [Value::Int(3), Value::Int(2), Value::Null] {
        let err = simple.set("attribute2", value).unwrap_err();
        assert!(matches!(err, SchemaError::ImmutableField { .. }));
    }
    assert_eq!(simple.get("attribute2").unwrap(), &Value::Int(2));
}

/// Writes to undeclared names are refused.
#[test]
fn test_unknown_field_access() {
    let schema = simple_schema("Simple");
    let mut simple = schema
        .from_value(dict(json!({"attribute1": 1.0, "attribute2": 2})))
        .unwrap();

    assert!(matches!(
        simple.get("attribute3"),
        Err(SchemaError::UnknownField { .. })
    ));
    assert!(matches!(
        simple.set("attribute3", 1.0),
        Err(SchemaError::UnknownField { .. })
    ));
    assert!(!simple.is_initialized("attribute3"));
}

// =============================================================================
// Union Tests
// =============================================================================

/// Overlapping union members are a contract violation, not a mismatch.
#[test]
fn test_overlapping_union_is_ambiguous() {
    let schema = SchemaBuilder::new("Loose")
        .field(
            "value",
            TypeExpr::union([TypeExpr::int(), TypeExpr::optional(TypeExpr::int())]),
        )
        .build()
        .unwrap();

    let err = schema.from_value(dict(json!({"value": 4}))).unwrap_err();
    assert!(matches!(err, SchemaError::AmbiguousUnion { .. }));
    assert!(err.is_fatal());

    // Conformance surfaces the defect as an error too
    assert!(schema.conforms_to(&dict(json!({"value": 4}))).is_err());
}

/// Disjoint unions accept any member and reject everything else.
#[test]
fn test_disjoint_union() {
    let schema = SchemaBuilder::new("Id")
        .field("id", TypeExpr::union([TypeExpr::int(), TypeExpr::text()]))
        .build()
        .unwrap();

    assert!(schema.from_value(dict(json!({"id": 7}))).is_ok());
    assert!(schema.from_value(dict(json!({"id": "seven"}))).is_ok());
    assert!(matches!(
        schema.from_value(dict(json!({"id": 7.5}))),
        Err(SchemaError::TypeMismatch { .. })
    ));
}

/// Unsupported type names fail loudly instead of matching nothing.
#[test]
fn test_unsupported_type() {
    let schema = SchemaBuilder::new("Odd")
        .field("value", TypeExpr::named("complex"))
        .build()
        .unwrap();

    let err = schema.from_value(dict(json!({"value": 1}))).unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedType { .. }));
}

// =============================================================================
// Null Handling Tests
// =============================================================================

/// Nulls accepted by the type are stored without running the validator.
#[test]
fn test_null_skips_validator() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let schema = SchemaBuilder::new("Pay")
        .field_with(
            "salary",
            TypeExpr::optional(TypeExpr::real()),
            FieldOptions::new().mutable().validator(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                v.as_real().is_some_and(|r| r > 0.0)
            }),
        )
        .build()
        .unwrap();

    let mut pay = schema.from_value(dict(json!({"salary": null}))).unwrap();
    assert_eq!(pay.get("salary").unwrap(), &Value::Null);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    pay.set("salary", 10.0).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(matches!(
        pay.set("salary", -1.0),
        Err(SchemaError::Validation { .. })
    ));
    assert_eq!(pay.get("salary").unwrap(), &Value::Real(10.0));
}

/// Null is a type mismatch for non-optional fields.
#[test]
fn test_null_rejected_for_required_type() {
    let schema = simple_schema("Simple");
    let err = schema
        .from_value(dict(json!({"attribute1": null, "attribute2": 2})))
        .unwrap_err();
    assert!(matches!(err, SchemaError::TypeMismatch { .. }));
}

// =============================================================================
// Equality Tests
// =============================================================================

/// Equal values from the same definition are equal; a twin definition is not.
#[test]
fn test_equality_requires_same_definition() {
    let schema = simple_schema("Simple");
    let twin = simple_schema("Simple");
    let input = dict(json!({"attribute1": 1.0, "attribute2": 2}));

    let a = schema.from_value(input.clone()).unwrap();
    let b = schema.from_value(input.clone()).unwrap();
    assert_eq!(a, b);

    let c = schema
        .from_value(dict(json!({"attribute1": 1.1, "attribute2": 2})))
        .unwrap();
    assert_ne!(a, c);

    let d = twin.from_value(input).unwrap();
    assert_ne!(a, d);
}

// =============================================================================
// Conformance Tests
// =============================================================================

/// Conformance mirrors construction without building anything.
#[test]
fn test_conformance() {
    let mut registry = SchemaRegistry::new();
    registry.register(simple_schema("Simple")).unwrap();

    let good = dict(json!({"attribute1": 1.0, "attribute2": 2}));
    assert!(registry.conforms_to("Simple", &good).unwrap());

    let extra = dict(json!({"attribute1": 1.0, "attribute2": 2, "x": 1}));
    assert!(!registry.conforms_to("Simple", &extra).unwrap());

    assert!(!registry.conforms_to("Simple", &Value::Int(1)).unwrap());

    let built = registry.construct("Simple", good).unwrap();
    assert!(registry
        .conforms_to("Simple", &Value::Instance(built))
        .unwrap());

    assert!(matches!(
        registry.conforms_to("Other", &Value::Null),
        Err(SchemaError::UnknownSchema(_))
    ));
}
