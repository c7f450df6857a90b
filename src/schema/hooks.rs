//! Named validators and coercions
//!
//! Declaration files cannot carry closures, so they refer to validators and
//! coercions by name. A name with no registered hook is a declaration error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::field::{Coercion, Validator};
use super::value::Value;

/// Table of named hooks
#[derive(Clone, Default)]
pub struct Hooks {
    validators: HashMap<String, Validator>,
    coercions: HashMap<String, Coercion>,
}

impl Hooks {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the built-in hooks.
    ///
    /// Coercions: `iso_date`, `iso_datetime`, `int_to_real`.
    /// Validators: `positive`, `non_empty`.
    pub fn with_builtins() -> Self {
        let mut hooks = Self::new();
        hooks.coercions.insert("iso_date".into(), iso_date());
        hooks.coercions.insert("iso_datetime".into(), iso_datetime());
        hooks.coercions.insert("int_to_real".into(), Arc::new(int_to_real));
        hooks.validators.insert("positive".into(), Arc::new(positive));
        hooks.validators.insert("non_empty".into(), Arc::new(non_empty));
        hooks
    }

    pub fn register_validator(
        &mut self,
        name: impl Into<String>,
        validator: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.validators.insert(name.into(), Arc::new(validator));
        self
    }

    pub fn register_coercion(
        &mut self,
        name: impl Into<String>,
        coercion: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.coercions.insert(name.into(), Arc::new(coercion));
        self
    }

    pub fn validator(&self, name: &str) -> Option<Validator> {
        self.validators.get(name).cloned()
    }

    pub fn coercion(&self, name: &str) -> Option<Coercion> {
        self.coercions.get(name).cloned()
    }
}

/// Coerces text in the given `chrono` format into a timestamp.
///
/// Formats without a time part yield midnight. Anything that does not parse
/// is returned unchanged so the type check reports it.
pub fn timestamp_from_text(format: impl Into<String>) -> Coercion {
    let format = format.into();
    Arc::new(move |raw: Value| match raw {
        Value::Text(text) => parse_timestamp(&text, &format)
            .map(Value::Timestamp)
            .unwrap_or(Value::Text(text)),
        other => other,
    })
}

fn parse_timestamp(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn iso_date() -> Coercion {
    timestamp_from_text("%Y-%m-%d")
}

fn iso_datetime() -> Coercion {
    Arc::new(|raw: Value| match raw {
        Value::Text(text) => parse_timestamp(&text, "%Y-%m-%dT%H:%M:%S")
            .or_else(|| {
                DateTime::parse_from_rfc3339(&text)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
            .map(Value::Timestamp)
            .unwrap_or(Value::Text(text)),
        other => other,
    })
}

fn int_to_real(raw: Value) -> Value {
    match raw {
        Value::Int(i) => Value::Real(i as f64),
        other => other,
    }
}

fn positive(value: &Value) -> bool {
    match value {
        Value::Int(i) => *i > 0,
        Value::Real(r) => *r > 0.0,
        _ => false,
    }
}

fn non_empty(value: &Value) -> bool {
    match value {
        Value::Text(s) => !s.is_empty(),
        Value::Seq(items) => !items.is_empty(),
        Value::Map(map) => !map.is_empty(),
        _ => false,
    }
}
