//! dtoschema - runtime schema validation for typed objects
//!
//! Schemas declare fields with type expressions, validators and coercions.
//! Instances are constructed from dictionaries or JSON text and exist only
//! when every field passed.

pub mod cli;
pub mod observability;
pub mod schema;

pub use schema::{
    Instance, SchemaBuilder, SchemaDef, SchemaError, SchemaRegistry, SchemaResult, TypeExpr, Value,
};
