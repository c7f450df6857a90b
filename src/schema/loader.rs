//! Schema loader for declaration files
//!
//! - One schema per `*.json` file in the schema directory
//! - Field types use the type expression syntax; other schemas are referenced by name
//! - Validators and coercions are referenced by hook name
//! - Declarations are built in dependency order; cycles are rejected

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::definition::{SchemaBuilder, SchemaDef};
use super::errors::{SchemaError, SchemaResult};
use super::field::FieldOptions;
use super::hooks::Hooks;
use super::registry::SchemaRegistry;
use super::types::TypeExpr;
use crate::observability::{log_event_with_fields, Event};

/// Declaration file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    pub name: String,
    #[serde(default)]
    pub partial: bool,
    pub fields: Vec<FieldDecl>,
}

/// One field of a declaration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    /// Type expression text, e.g. `optional<real>` or `seq<Car>`
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "default_immutable")]
    pub immutable: bool,
    /// Validator hook name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    /// Coercion hook name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coerce: Option<String>,
}

fn default_immutable() -> bool {
    true
}

impl SchemaDecl {
    /// Parses a declaration from JSON text
    pub fn from_json(text: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A declaration with its field types parsed but not yet resolved
struct ParsedDecl {
    decl: SchemaDecl,
    types: Vec<TypeExpr>,
}

impl ParsedDecl {
    fn parse(decl: SchemaDecl) -> SchemaResult<Self> {
        let types = decl
            .fields
            .iter()
            .map(|field| {
                TypeExpr::parse(&field.ty).map_err(|e| {
                    SchemaError::declaration(&decl.name, format!("field '{}': {}", field.name, e))
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(Self { decl, types })
    }

    fn references(&self) -> impl Iterator<Item = &str> {
        self.types.iter().flat_map(TypeExpr::named_refs)
    }
}

/// Loads declaration files into a [`SchemaRegistry`]
pub struct SchemaLoader {
    /// Directory containing declaration files
    schema_dir: PathBuf,
    hooks: Hooks,
}

impl SchemaLoader {
    /// Creates a loader for `schema_dir` with the built-in hooks.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            hooks: Hooks::with_builtins(),
        }
    }

    /// Replaces the hook table used to resolve validator and coercion names.
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Reads every `*.json` declaration in the schema directory, sorted by path.
    pub fn read_declarations(&self) -> SchemaResult<Vec<SchemaDecl>> {
        let entries = fs::read_dir(&self.schema_dir).map_err(|e| io_error(&self.schema_dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&self.schema_dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|path| read_declaration(path)).collect()
    }

    /// Loads every declaration file and registers the resulting schemas.
    ///
    /// Returns the number of schemas registered.
    pub fn load_all(&self, registry: &mut SchemaRegistry) -> SchemaResult<usize> {
        let decls = self.read_declarations()?;
        let count = self.register_all(decls, registry)?;

        let count_str = count.to_string();
        let dir = self.schema_dir.display().to_string();
        log_event_with_fields(
            Event::SchemasLoaded,
            &[("count", count_str.as_str()), ("schema_dir", dir.as_str())],
        );
        Ok(count)
    }

    /// Registers a single declaration given as JSON text.
    ///
    /// Referenced schemas must already be registered.
    pub fn load_str(&self, text: &str, registry: &mut SchemaRegistry) -> SchemaResult<Arc<SchemaDef>> {
        let parsed = ParsedDecl::parse(SchemaDecl::from_json(text)?)?;
        let schema = self.build(parsed, &|name: &str| registry.get(name).cloned())?;
        registry.register(Arc::clone(&schema))?;
        Ok(schema)
    }

    /// Builds and registers declarations in dependency order.
    ///
    /// Nothing is registered unless every declaration builds.
    pub fn register_all(
        &self,
        decls: Vec<SchemaDecl>,
        registry: &mut SchemaRegistry,
    ) -> SchemaResult<usize> {
        let mut names = BTreeSet::new();
        for decl in &decls {
            if registry.contains(&decl.name) || !names.insert(decl.name.clone()) {
                return Err(SchemaError::declaration(
                    &decl.name,
                    "a schema with this name is already declared",
                ));
            }
        }

        let mut pending = decls
            .into_iter()
            .map(ParsedDecl::parse)
            .collect::<SchemaResult<Vec<_>>>()?;
        let mut staged: Vec<Arc<SchemaDef>> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|parsed| parsed.references().all(|name| !names.contains(name)));

            let Some(index) = ready else {
                let stuck: Vec<&str> = pending.iter().map(|p| p.decl.name.as_str()).collect();
                return Err(SchemaError::declaration(
                    stuck[0],
                    format!("cyclic schema references among {:?}", stuck),
                ));
            };

            let parsed = pending.remove(index);
            names.remove(&parsed.decl.name);
            let lookup = |name: &str| {
                registry.get(name).cloned().or_else(|| {
                    staged.iter().find(|schema| schema.name() == name).cloned()
                })
            };
            let schema = self.build(parsed, &lookup)?;
            staged.push(schema);
        }

        let registered = staged.len();
        for schema in staged {
            registry.register(schema)?;
        }
        Ok(registered)
    }

    /// Saves a declaration as `schema_<name>.json` in the schema directory.
    ///
    /// Existing files are never overwritten.
    pub fn save_declaration(&self, decl: &SchemaDecl) -> SchemaResult<PathBuf> {
        let path = self.schema_dir.join(format!("schema_{}.json", decl.name));
        if path.exists() {
            return Err(SchemaError::declaration(
                &decl.name,
                format!("declaration file '{}' already exists", path.display()),
            ));
        }

        fs::create_dir_all(&self.schema_dir).map_err(|e| io_error(&self.schema_dir, e))?;
        let content = serde_json::to_string_pretty(decl)?;
        fs::write(&path, content).map_err(|e| io_error(&path, e))?;
        Ok(path)
    }

    fn build(
        &self,
        parsed: ParsedDecl,
        lookup: &dyn Fn(&str) -> Option<Arc<SchemaDef>>,
    ) -> SchemaResult<Arc<SchemaDef>> {
        let ParsedDecl { decl, types } = parsed;

        let mut builder = SchemaBuilder::new(&decl.name).partial(decl.partial);
        for (field, ty) in decl.fields.iter().zip(types) {
            let options = self.field_options(&decl.name, field)?;
            builder = builder.field_with(&field.name, ty.resolve(lookup), options);
        }
        builder.build()
    }

    fn field_options(&self, schema: &str, field: &FieldDecl) -> SchemaResult<FieldOptions> {
        let mut options = FieldOptions::new();
        options.immutable = field.immutable;

        if let Some(name) = &field.validator {
            options.validator = Some(self.hooks.validator(name).ok_or_else(|| {
                SchemaError::declaration(
                    schema,
                    format!("validator '{}' for field '{}' is not callable", name, field.name),
                )
            })?);
        }
        if let Some(name) = &field.coerce {
            options.coerce = Some(self.hooks.coercion(name).ok_or_else(|| {
                SchemaError::declaration(
                    schema,
                    format!("coercion '{}' for field '{}' is not callable", name, field.name),
                )
            })?);
        }
        Ok(options)
    }
}

fn read_declaration(path: &Path) -> SchemaResult<SchemaDecl> {
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        SchemaError::declaration(path.display().to_string(), format!("invalid JSON: {}", e))
    })
}

fn io_error(path: &Path, source: std::io::Error) -> SchemaError {
    SchemaError::Io {
        path: path.display().to_string(),
        source,
    }
}
