//! Type expressions
//!
//! Supported shapes:
//! - scalar kinds: `text`, `int`, `real`, `bool`, `map`, `seq`, `timestamp`
//! - `optional<T>`: null or a `T`
//! - `union<A, B, ...>`: exactly one member must match
//! - nested schema references, written as the schema name
//! - `map<K, V>` and `seq<T>` containers
//!
//! `null` may appear as a union member, turning the union into an optional.
//! Any other unknown identifier parses as [`TypeExpr::Named`], which the
//! matcher reports as unsupported.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::definition::SchemaDef;

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Int,
    Real,
    Bool,
    /// Any dictionary
    Map,
    /// Any sequence
    Seq,
    Timestamp,
}

impl ScalarKind {
    /// Returns the type name used in type expressions and error messages
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Int => "int",
            ScalarKind::Real => "real",
            ScalarKind::Bool => "bool",
            ScalarKind::Map => "map",
            ScalarKind::Seq => "seq",
            ScalarKind::Timestamp => "timestamp",
        }
    }

    /// Looks up a scalar kind by its type name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(ScalarKind::Text),
            "int" => Some(ScalarKind::Int),
            "real" => Some(ScalarKind::Real),
            "bool" => Some(ScalarKind::Bool),
            "map" => Some(ScalarKind::Map),
            "seq" => Some(ScalarKind::Seq),
            "timestamp" => Some(ScalarKind::Timestamp),
            _ => None,
        }
    }
}

/// Description of the values a field accepts
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Scalar(ScalarKind),
    Nullable(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// Nested schema
    SchemaRef(Arc<SchemaDef>),
    MapOf(Box<TypeExpr>, Box<TypeExpr>),
    SeqOf(Box<TypeExpr>),
    /// Unresolved type name with no checker
    Named(String),
}

impl TypeExpr {
    pub fn text() -> Self {
        TypeExpr::Scalar(ScalarKind::Text)
    }

    pub fn int() -> Self {
        TypeExpr::Scalar(ScalarKind::Int)
    }

    pub fn real() -> Self {
        TypeExpr::Scalar(ScalarKind::Real)
    }

    pub fn boolean() -> Self {
        TypeExpr::Scalar(ScalarKind::Bool)
    }

    pub fn map() -> Self {
        TypeExpr::Scalar(ScalarKind::Map)
    }

    pub fn seq() -> Self {
        TypeExpr::Scalar(ScalarKind::Seq)
    }

    pub fn timestamp() -> Self {
        TypeExpr::Scalar(ScalarKind::Timestamp)
    }

    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Nullable(Box::new(inner))
    }

    pub fn union(members: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Union(members.into_iter().collect())
    }

    pub fn schema(schema: &Arc<SchemaDef>) -> Self {
        TypeExpr::SchemaRef(Arc::clone(schema))
    }

    pub fn map_of(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::MapOf(Box::new(key), Box::new(value))
    }

    pub fn seq_of(element: TypeExpr) -> Self {
        TypeExpr::SeqOf(Box::new(element))
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    /// Parses the textual syntax
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        Parser::new(input).parse()
    }

    /// Checks structural rules that cannot be expressed in the type itself.
    pub(crate) fn check_structure(&self) -> Result<(), String> {
        match self {
            TypeExpr::Scalar(_) | TypeExpr::SchemaRef(_) | TypeExpr::Named(_) => Ok(()),
            TypeExpr::Nullable(inner) | TypeExpr::SeqOf(inner) => inner.check_structure(),
            TypeExpr::MapOf(key, value) => {
                key.check_structure()?;
                value.check_structure()
            }
            TypeExpr::Union(members) => {
                if members.len() < 2 {
                    return Err(format!(
                        "union must have at least two members, got {}",
                        members.len()
                    ));
                }
                members.iter().try_for_each(TypeExpr::check_structure)
            }
        }
    }

    /// Collects every unresolved name referenced by this expression
    pub fn named_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_named(&mut names);
        names
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Named(name) => out.push(name),
            TypeExpr::Scalar(_) | TypeExpr::SchemaRef(_) => {}
            TypeExpr::Nullable(inner) | TypeExpr::SeqOf(inner) => inner.collect_named(out),
            TypeExpr::MapOf(key, value) => {
                key.collect_named(out);
                value.collect_named(out);
            }
            TypeExpr::Union(members) => members.iter().for_each(|m| m.collect_named(out)),
        }
    }

    /// Replaces every `Named` reference that `lookup` knows with a schema reference.
    pub fn resolve(self, lookup: &dyn Fn(&str) -> Option<Arc<SchemaDef>>) -> TypeExpr {
        match self {
            TypeExpr::Named(name) => match lookup(&name) {
                Some(schema) => TypeExpr::SchemaRef(schema),
                None => TypeExpr::Named(name),
            },
            TypeExpr::Nullable(inner) => TypeExpr::Nullable(Box::new(inner.resolve(lookup))),
            TypeExpr::SeqOf(inner) => TypeExpr::SeqOf(Box::new(inner.resolve(lookup))),
            TypeExpr::MapOf(key, value) => TypeExpr::MapOf(
                Box::new(key.resolve(lookup)),
                Box::new(value.resolve(lookup)),
            ),
            TypeExpr::Union(members) => {
                TypeExpr::Union(members.into_iter().map(|m| m.resolve(lookup)).collect())
            }
            other => other,
        }
    }
}

impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeExpr::Scalar(a), TypeExpr::Scalar(b)) => a == b,
            (TypeExpr::Nullable(a), TypeExpr::Nullable(b)) => a == b,
            (TypeExpr::Union(a), TypeExpr::Union(b)) => a == b,
            (TypeExpr::SchemaRef(a), TypeExpr::SchemaRef(b)) => Arc::ptr_eq(a, b),
            (TypeExpr::MapOf(ak, av), TypeExpr::MapOf(bk, bv)) => ak == bk && av == bv,
            (TypeExpr::SeqOf(a), TypeExpr::SeqOf(b)) => a == b,
            (TypeExpr::Named(a), TypeExpr::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(kind) => write!(f, "{}", kind.name()),
            TypeExpr::Nullable(inner) => write!(f, "optional<{}>", inner),
            TypeExpr::Union(members) => {
                write!(f, "union<")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, ">")
            }
            TypeExpr::SchemaRef(schema) => write!(f, "{}", schema.name()),
            TypeExpr::MapOf(key, value) => write!(f, "map<{}, {}>", key, value),
            TypeExpr::SeqOf(inner) => write!(f, "seq<{}>", inner),
            TypeExpr::Named(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeExpr::parse(s)
    }
}

/// Type expression syntax error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type expression '{input}' at position {position}: {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub position: usize,
    pub reason: String,
}

/// Union member before `null` members are folded into an optional
enum Member {
    Null,
    Type(TypeExpr),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> Result<TypeExpr, TypeParseError> {
        let expr = self.expr()?;
        self.skip_ws();
        if self.pos < self.input.len() {
            return Err(self.error(self.pos, "unexpected trailing input"));
        }
        Ok(expr)
    }

    fn expr(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        match self.member()? {
            Member::Type(expr) => Ok(expr),
            Member::Null => Err(self.error(start, "null is only allowed as a union member")),
        }
    }

    fn member(&mut self) -> Result<Member, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        let ident = self.ident()?;
        self.skip_ws();

        if !self.eat('<') {
            return Ok(match ident {
                "null" => Member::Null,
                "optional" | "union" => {
                    return Err(self.error(start, format!("'{}' requires parameters", ident)))
                }
                name => Member::Type(match ScalarKind::from_name(name) {
                    Some(kind) => TypeExpr::Scalar(kind),
                    None => TypeExpr::Named(name.to_string()),
                }),
            });
        }

        let args = self.args()?;
        let expr = match ident {
            "optional" => {
                let [inner] = self.exact::<1>(start, ident, args)?;
                TypeExpr::Nullable(Box::new(inner))
            }
            "map" => {
                let [key, value] = self.exact::<2>(start, ident, args)?;
                TypeExpr::MapOf(Box::new(key), Box::new(value))
            }
            "seq" => {
                let [element] = self.exact::<1>(start, ident, args)?;
                TypeExpr::SeqOf(Box::new(element))
            }
            "union" => self.union(start, args)?,
            other => {
                return Err(self.error(start, format!("type '{}' takes no parameters", other)))
            }
        };
        Ok(Member::Type(expr))
    }

    fn args(&mut self) -> Result<Vec<Member>, TypeParseError> {
        let mut args = Vec::new();
        loop {
            args.push(self.member()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('>') {
                return Ok(args);
            }
            return Err(self.error(self.pos, "expected ',' or '>'"));
        }
    }

    fn exact<const N: usize>(
        &self,
        start: usize,
        ident: &str,
        args: Vec<Member>,
    ) -> Result<[TypeExpr; N], TypeParseError> {
        let count = args.len();
        let types = args
            .into_iter()
            .map(|member| match member {
                Member::Type(expr) => Ok(expr),
                Member::Null => Err(self.error(start, "null is only allowed as a union member")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        types.try_into().map_err(|_| {
            self.error(
                start,
                format!("'{}' takes {} parameter(s), got {}", ident, N, count),
            )
        })
    }

    fn union(&self, start: usize, args: Vec<Member>) -> Result<TypeExpr, TypeParseError> {
        let total = args.len();
        let mut nullable = false;
        let mut members = Vec::with_capacity(total);
        for arg in args {
            match arg {
                Member::Null => nullable = true,
                Member::Type(expr) => members.push(expr),
            }
        }

        if total < 2 {
            return Err(self.error(start, "union must have at least two members"));
        }

        let base = match members.len() {
            0 => return Err(self.error(start, "union of only null")),
            1 => members.remove(0),
            _ => TypeExpr::Union(members),
        };
        Ok(if nullable {
            TypeExpr::Nullable(Box::new(base))
        } else {
            base
        })
    }

    fn ident(&mut self) -> Result<&'a str, TypeParseError> {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest
            .char_indices()
            .find(|(i, c)| {
                !(c.is_ascii_alphabetic() || *c == '_' || (*i > 0 && c.is_ascii_digit()))
            })
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error(start, "expected a type name"));
        }
        self.pos += len;
        Ok(&self.input[start..start + len])
    }

    fn eat(&mut self, c: char) -> bool {
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            position,
            reason: reason.into(),
        }
    }
}
