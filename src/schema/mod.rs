//! Runtime schema validation for typed objects
//!
//! Schemas declare per-field type contracts; instances are built from
//! untyped dictionaries or JSON text and only exist once every field passed
//! coercion, type checking and validation.
//!
//! # Design Principles
//!
//! - Construction is all or nothing
//! - Fields are immutable after the first set unless declared mutable
//! - Kinds are strict, no implicit widening
//! - Union members must be mutually exclusive for any value
//! - Null values skip validators
//! - Coercion runs before type checking

mod definition;
mod errors;
mod field;
mod hooks;
mod instance;
mod loader;
mod matcher;
mod registry;
mod types;
mod value;

pub use definition::{SchemaBuilder, SchemaDef};
pub use errors::{SchemaError, SchemaResult, Severity};
pub use field::{Coercion, FieldDescriptor, FieldOptions, Validator};
pub use hooks::{timestamp_from_text, Hooks};
pub use instance::Instance;
pub use loader::{FieldDecl, SchemaDecl, SchemaLoader};
pub use matcher::{match_type, type_matches, Resolved};
pub use registry::SchemaRegistry;
pub use types::{ScalarKind, TypeExpr, TypeParseError};
pub use value::{Map, Value, TIMESTAMP_FORMAT};
