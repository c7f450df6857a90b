//! Type matcher
//!
//! Decides whether a value conforms to a type expression and which branch it
//! resolved to. A plain mismatch is `Ok(None)`; errors are reserved for
//! defects in the type expression itself (ambiguous unions, unsupported
//! types) so that callers checking conformance can tell the two apart.

use super::errors::{SchemaError, SchemaResult};
use super::types::TypeExpr;
use super::value::Value;

/// Outcome of a successful match
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// The value is null and the expression allowed it
    Null,
    /// The most specific branch the value matched
    Type(&'a TypeExpr),
}

impl Resolved<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Null)
    }
}

/// Matches `value` against `ty`.
///
/// # Errors
///
/// - `AmbiguousUnion` if a union has more than one matching member
/// - `UnsupportedType` if the expression contains a name with no checker
pub fn match_type<'a>(ty: &'a TypeExpr, value: &Value) -> SchemaResult<Option<Resolved<'a>>> {
    match ty {
        TypeExpr::Scalar(kind) => {
            Ok((value.scalar_kind() == Some(*kind)).then_some(Resolved::Type(ty)))
        }
        TypeExpr::Nullable(inner) => {
            if value.is_null() {
                Ok(Some(Resolved::Null))
            } else {
                match_type(inner, value)
            }
        }
        TypeExpr::Union(members) => match_union(ty, members, value),
        TypeExpr::SchemaRef(schema) => {
            Ok(schema.conforms_to(value)?.then_some(Resolved::Type(ty)))
        }
        TypeExpr::MapOf(key_type, value_type) => {
            let Some(map) = value.as_map() else {
                return Ok(None);
            };
            // Each entry: actual key against the key type, actual value against the value type
            for (key, entry) in map {
                if match_type(key_type, &Value::Text(key.clone()))?.is_none() {
                    return Ok(None);
                }
                if match_type(value_type, entry)?.is_none() {
                    return Ok(None);
                }
            }
            Ok(Some(Resolved::Type(ty)))
        }
        TypeExpr::SeqOf(element_type) => {
            let Some(items) = value.as_seq() else {
                return Ok(None);
            };
            // Empty sequences match regardless of the element type
            for item in items {
                if match_type(element_type, item)?.is_none() {
                    return Ok(None);
                }
            }
            Ok(Some(Resolved::Type(ty)))
        }
        TypeExpr::Named(name) => Err(SchemaError::UnsupportedType { ty: name.clone() }),
    }
}

fn match_union<'a>(
    ty: &'a TypeExpr,
    members: &'a [TypeExpr],
    value: &Value,
) -> SchemaResult<Option<Resolved<'a>>> {
    let mut matched = Vec::with_capacity(1);
    for member in members {
        if let Some(resolved) = match_type(member, value)? {
            matched.push(resolved);
        }
    }

    match matched.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        _ => Err(SchemaError::AmbiguousUnion {
            ty: ty.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Returns whether `value` matches `ty`, treating a plain mismatch as `false`.
pub fn type_matches(ty: &TypeExpr, value: &Value) -> SchemaResult<bool> {
    Ok(match_type(ty, value)?.is_some())
}
