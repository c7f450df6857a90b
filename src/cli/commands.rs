//! CLI command implementations
//!
//! Every command loads the configuration, applies its log level, loads the
//! schema directory into a fresh registry and then does its one job.
//! Command functions return the `data` payload; `run_command` owns stdout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::{SchemaDef, SchemaError, SchemaLoader, SchemaRegistry};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding schema declaration files (required)
    pub schema_dir: PathBuf,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// A relative `schema_dir` is resolved against the directory holding the
    /// configuration file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        if config.schema_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.schema_dir = parent.join(&config.schema_dir);
            }
        }

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(|e| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    /// Get schema directory as Path
    pub fn schema_path(&self) -> &Path {
        &self.schema_dir
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command and write its JSON response
///
/// Failures are logged and written as an error response before being
/// returned; callers only need to set the exit status.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let name = cmd.name();
    let result = match cmd {
        Command::Schemas { config } => schemas(&config),
        Command::Construct {
            config,
            schema,
            input,
        } => construct(&config, &schema, input.as_deref()),
        Command::Conforms {
            config,
            schema,
            input,
        } => conforms(&config, &schema, input.as_deref()),
    };

    match result {
        Ok(data) => {
            write_response(data)?;
            log_event_with_fields(Event::CommandComplete, &[("command", name)]);
            Ok(())
        }
        Err(e) => {
            log_event_with_fields(
                Event::CommandFailed,
                &[("command", name), ("code", e.code_str())],
            );
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Describe every registered schema
pub fn schemas(config_path: &Path) -> CliResult<Value> {
    let registry = boot(config_path)?;
    let described: Vec<Value> = registry.iter().map(|schema| describe(schema)).collect();
    Ok(Value::Array(described))
}

/// Construct an instance of `schema` from a JSON document
pub fn construct(config_path: &Path, schema: &str, input: Option<&Path>) -> CliResult<Value> {
    let registry = boot(config_path)?;
    let text = read_document(input)?;
    let instance = registry.from_json(schema, &text)?;
    Ok(instance.to_json())
}

/// Check a JSON document against `schema` without constructing it
pub fn conforms(config_path: &Path, schema: &str, input: Option<&Path>) -> CliResult<Value> {
    let registry = boot(config_path)?;
    let text = read_document(input)?;
    let document: serde_json::Value = serde_json::from_str(&text).map_err(SchemaError::from)?;
    let conforms = registry.conforms_to(schema, &document.into())?;
    Ok(json!({ "conforms": conforms }))
}

/// Load configuration, apply the log level and load the schema directory
fn boot(config_path: &Path) -> CliResult<SchemaRegistry> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);

    let config_display = config_path.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", config_display.as_str())]);

    if !config.schema_path().is_dir() {
        return Err(CliError::config_error(format!(
            "schema_dir '{}' is not a directory",
            config.schema_path().display()
        )));
    }

    let mut registry = SchemaRegistry::new();
    SchemaLoader::new(config.schema_path()).load_all(&mut registry)?;
    Ok(registry)
}

fn describe(schema: &SchemaDef) -> Value {
    let fields: Vec<Value> = schema
        .fields()
        .iter()
        .map(|field| {
            json!({
                "name": field.name(),
                "type": field.type_expr().to_string(),
                "immutable": field.is_immutable(),
                "validator": field.has_validator(),
                "coerce": field.has_coercion(),
            })
        })
        .collect();

    json!({
        "name": schema.name(),
        "partial": schema.is_partial(),
        "fields": fields,
    })
}
