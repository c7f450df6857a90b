//! Schema error types
//!
//! Error codes:
//! - DTO_DECLARATION_INVALID (FATAL)
//! - DTO_SCHEMA_MISMATCH (REJECT)
//! - DTO_TYPE_MISMATCH (REJECT)
//! - DTO_VALIDATION_FAILED (REJECT)
//! - DTO_FIELD_IMMUTABLE (REJECT)
//! - DTO_FIELD_UNINITIALIZED (REJECT)
//! - DTO_AMBIGUOUS_UNION (FATAL)
//! - DTO_UNSUPPORTED_TYPE (FATAL)
//!
//! FATAL errors are defects in a schema declaration, REJECT errors are bad
//! input from the caller.

use std::fmt;
use std::io;

use thiserror::Error;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller input rejected
    Reject,
    /// Schema declaration is broken and must be fixed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while declaring schemas, constructing instances or
/// accessing their fields.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema declaration is malformed (bad hook, duplicate field, bad type).
    #[error("invalid declaration of schema '{schema}': {reason}")]
    Declaration { schema: String, reason: String },

    /// Input key set violates the full/partial policy.
    #[error("schema '{schema}' fields {declared:?} mismatch the dictionary keys {found:?}")]
    SchemaMismatch {
        schema: String,
        partial: bool,
        declared: Vec<String>,
        found: Vec<String>,
    },

    /// Value shape does not match the declared type expression.
    #[error("value {value} is not of type '{expected}' (field '{field}' of schema '{schema}')")]
    TypeMismatch {
        schema: String,
        field: String,
        expected: String,
        value: String,
    },

    /// Value passed type checking but failed the field validator.
    #[error("{value} is not a valid value for field '{field}' of schema '{schema}'")]
    Validation {
        schema: String,
        field: String,
        value: String,
    },

    /// Attempt to reassign an initialized immutable field.
    #[error("immutable field '{field}' of schema '{schema}' cannot be changed")]
    ImmutableField { schema: String, field: String },

    /// Read of a field that was never set.
    #[error("field '{field}' of schema '{schema}' is not initialized")]
    UninitializedField { schema: String, field: String },

    /// Value matches more than one member of a union.
    #[error("value {value} matches multiple members of type '{ty}'")]
    AmbiguousUnion { ty: String, value: String },

    /// Type expression the matcher has no checker for.
    #[error("type checker for type '{ty}' is not implemented")]
    UnsupportedType { ty: String },

    /// Field name not declared by the schema.
    #[error("schema '{schema}' has no field '{field}'")]
    UnknownField { schema: String, field: String },

    /// Schema name not present in the registry.
    #[error("schema '{0}' not found")]
    UnknownSchema(String),

    /// Constructing input is not a dictionary.
    #[error("schema '{schema}' expects a dictionary, got {found}")]
    NotAnObject { schema: String, found: &'static str },

    /// JSON text could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Declaration file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SchemaError {
    pub(crate) fn declaration(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Declaration {
            schema: schema.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Declaration { .. } => "DTO_DECLARATION_INVALID",
            SchemaError::SchemaMismatch { .. } => "DTO_SCHEMA_MISMATCH",
            SchemaError::TypeMismatch { .. } => "DTO_TYPE_MISMATCH",
            SchemaError::Validation { .. } => "DTO_VALIDATION_FAILED",
            SchemaError::ImmutableField { .. } => "DTO_FIELD_IMMUTABLE",
            SchemaError::UninitializedField { .. } => "DTO_FIELD_UNINITIALIZED",
            SchemaError::AmbiguousUnion { .. } => "DTO_AMBIGUOUS_UNION",
            SchemaError::UnsupportedType { .. } => "DTO_UNSUPPORTED_TYPE",
            SchemaError::UnknownField { .. } => "DTO_UNKNOWN_FIELD",
            SchemaError::UnknownSchema(_) => "DTO_UNKNOWN_SCHEMA",
            SchemaError::NotAnObject { .. } => "DTO_NOT_AN_OBJECT",
            SchemaError::Json(_) => "DTO_INVALID_JSON",
            SchemaError::Io { .. } => "DTO_IO_ERROR",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaError::Declaration { .. }
            | SchemaError::AmbiguousUnion { .. }
            | SchemaError::UnsupportedType { .. } => Severity::Fatal,
            _ => Severity::Reject,
        }
    }

    /// Returns whether this error points at a broken schema rather than bad input
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
