//! Declaration Loading Tests
//!
//! Schemas declared as JSON files in a schema directory:
//! - References between files resolve regardless of file order
//! - Hook names resolve to validators and coercions
//! - Broken declarations are rejected before anything is constructed

use std::fs;

use dtoschema::schema::{
    Hooks, SchemaDecl, SchemaError, SchemaLoader, SchemaRegistry, TypeExpr, Value,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_decl(dir: &TempDir, file: &str, body: serde_json::Value) {
    fs::write(dir.path().join(file), body.to_string()).unwrap();
}

fn office_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    // "a_" sorts before the schemas it references
    write_decl(
        &dir,
        "a_user.json",
        json!({
            "name": "User",
            "fields": [
                {"name": "name", "type": "text", "validator": "non_empty"},
                {"name": "email", "type": "text", "immutable": false},
                {"name": "birth", "type": "timestamp", "coerce": "iso_date"},
                {"name": "address", "type": "Address"},
                {"name": "cars", "type": "seq<Car>"}
            ]
        }),
    );
    write_decl(
        &dir,
        "b_address.json",
        json!({"name": "Address", "fields": [{"name": "city", "type": "text"}]}),
    );
    write_decl(
        &dir,
        "c_car.json",
        json!({
            "name": "Car",
            "partial": true,
            "fields": [
                {"name": "year", "type": "int", "validator": "after_1980"},
                {"name": "license", "type": "text"}
            ]
        }),
    );
    fs::write(dir.path().join("notes.txt"), "not a declaration").unwrap();
    dir
}

fn office_hooks() -> Hooks {
    let mut hooks = Hooks::with_builtins();
    hooks.register_validator("after_1980", |v| v.as_int().is_some_and(|y| y > 1980));
    hooks
}

// =============================================================================
// Loading Tests
// =============================================================================

/// Every declaration loads and cross-file references become nested schemas.
#[test]
fn test_load_all_resolves_references() {
    let dir = office_dir();
    let mut registry = SchemaRegistry::new();

    let loaded = SchemaLoader::new(dir.path())
        .with_hooks(office_hooks())
        .load_all(&mut registry)
        .unwrap();
    assert_eq!(loaded, 3);

    let user = registry.require("User").unwrap();
    let address = registry.require("Address").unwrap();
    assert_eq!(
        user.field("address").unwrap().type_expr(),
        &TypeExpr::schema(address)
    );
    assert!(!user.field("email").unwrap().is_immutable());
    assert!(registry.require("Car").unwrap().is_partial());
}

/// A loaded schema constructs nested instances and applies hooks.
#[test]
fn test_loaded_schema_constructs() {
    let dir = office_dir();
    let mut registry = SchemaRegistry::new();
    SchemaLoader::new(dir.path())
        .with_hooks(office_hooks())
        .load_all(&mut registry)
        .unwrap();

    let body = json!({
        "name": "dwight",
        "email": "dshrute@schrutefarms.com",
        "birth": "1974-01-20",
        "address": {"city": "scranton"},
        "cars": [{"year": 1987, "license": "4018 JXT", "color": "red"}]
    });
    let dwight = registry.from_json("User", &body.to_string()).unwrap();

    assert!(dwight.get("birth").unwrap().as_timestamp().is_some());
    assert_eq!(
        dwight.to_json()["cars"],
        json!([{"year": 1987, "license": "4018 JXT"}])
    );

    let mut old_car = body.clone();
    old_car["cars"][0]["year"] = json!(1970);
    let err = registry.from_json("User", &old_car.to_string()).unwrap_err();
    assert!(matches!(err, SchemaError::Validation { .. }));

    let mut blank = body;
    blank["name"] = json!("");
    let err = registry.construct("User", Value::from(blank)).unwrap_err();
    assert!(matches!(err, SchemaError::Validation { .. }));
}

// =============================================================================
// Rejection Tests
// =============================================================================

/// A hook name that is not registered is a declaration error.
#[test]
fn test_unknown_hook_is_declaration_error() {
    let dir = office_dir();
    let mut registry = SchemaRegistry::new();

    // Built-ins alone do not know "after_1980"
    let err = SchemaLoader::new(dir.path())
        .load_all(&mut registry)
        .unwrap_err();
    match err {
        SchemaError::Declaration { schema, reason } => {
            assert_eq!(schema, "Car");
            assert!(reason.contains("not callable"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Address built fine but the batch failed, so nothing is registered
    assert!(registry.is_empty());
    assert!(!registry.contains("Address"));
}

/// Schemas that reference each other cannot be built.
#[test]
fn test_cyclic_references_rejected() {
    let dir = TempDir::new().unwrap();
    write_decl(
        &dir,
        "a.json",
        json!({"name": "A", "fields": [{"name": "b", "type": "optional<B>"}]}),
    );
    write_decl(
        &dir,
        "b.json",
        json!({"name": "B", "fields": [{"name": "a", "type": "optional<A>"}]}),
    );

    let mut registry = SchemaRegistry::new();
    let err = SchemaLoader::new(dir.path())
        .load_all(&mut registry)
        .unwrap_err();
    assert!(matches!(err, SchemaError::Declaration { .. }));
    assert!(registry.is_empty());
}

/// Malformed files and type expressions are declaration errors.
#[test]
fn test_malformed_declarations() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.json"), "{\"name\": ").unwrap();

    let mut registry = SchemaRegistry::new();
    let err = SchemaLoader::new(dir.path())
        .load_all(&mut registry)
        .unwrap_err();
    assert!(matches!(err, SchemaError::Declaration { .. }));

    let loader = SchemaLoader::new(dir.path());
    let err = loader
        .load_str(
            r#"{"name": "Bad", "fields": [{"name": "x", "type": "union<int>"}]}"#,
            &mut registry,
        )
        .unwrap_err();
    assert!(matches!(err, SchemaError::Declaration { .. }));

    let err = loader
        .load_str(
            r#"{"name": "Bad", "fields": [{"name": "x", "type": "map<text"}]}"#,
            &mut registry,
        )
        .unwrap_err();
    assert!(matches!(err, SchemaError::Declaration { .. }));
}

/// Saved declarations load back and are never overwritten.
#[test]
fn test_save_declaration() {
    let dir = TempDir::new().unwrap();
    let loader = SchemaLoader::new(dir.path());

    let decl = SchemaDecl::from_json(
        r#"{"name": "Point", "fields": [{"name": "x", "type": "int"}, {"name": "y", "type": "int"}]}"#,
    )
    .unwrap();

    let path = loader.save_declaration(&decl).unwrap();
    assert!(path.ends_with("schema_Point.json"));
    assert!(loader.save_declaration(&decl).is_err());

    assert_eq!(loader.read_declarations().unwrap(), vec![decl]);

    let mut registry = SchemaRegistry::new();
    loader.load_all(&mut registry).unwrap();
    let point = registry
        .construct("Point", Value::from(json!({"x": 1, "y": 2})))
        .unwrap();
    assert_eq!(point.to_string(), "Point { x: 1, y: 2 }");
}
