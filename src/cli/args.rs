//! CLI argument definitions using clap
//!
//! Commands:
//! - dtoschema schemas --config <path>
//! - dtoschema construct --config <path> --schema <name> [--input <file>]
//! - dtoschema conforms --config <path> --schema <name> [--input <file>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dtoschema - runtime schema validation for JSON documents
#[derive(Parser, Debug)]
#[command(name = "dtoschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every schema declared in the schema directory
    Schemas {
        /// Path to configuration file
        #[arg(long, default_value = "./dtoschema.json")]
        config: PathBuf,
    },

    /// Construct an instance from a JSON document and print it
    Construct {
        /// Path to configuration file
        #[arg(long, default_value = "./dtoschema.json")]
        config: PathBuf,

        /// Name of the schema to construct
        #[arg(long)]
        schema: String,

        /// JSON document to read (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Check whether a JSON document conforms to a schema
    Conforms {
        /// Path to configuration file
        #[arg(long, default_value = "./dtoschema.json")]
        config: PathBuf,

        /// Name of the schema to check against
        #[arg(long)]
        schema: String,

        /// JSON document to read (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Command {
    /// Subcommand name as used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Command::Schemas { .. } => "schemas",
            Command::Construct { .. } => "construct",
            Command::Conforms { .. } => "conforms",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_args() {
        let cli = Cli::try_parse_from([
            "dtoschema",
            "construct",
            "--schema",
            "User",
            "--input",
            "user.json",
        ])
        .unwrap();

        match cli.command {
            Command::Construct {
                config,
                schema,
                input,
            } => {
                assert_eq!(config, PathBuf::from("./dtoschema.json"));
                assert_eq!(schema, "User");
                assert_eq!(input, Some(PathBuf::from("user.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_schema_flag_required() {
        assert!(Cli::try_parse_from(["dtoschema", "conforms"]).is_err());
    }

    #[test]
    fn test_command_names() {
        let cli = Cli::try_parse_from(["dtoschema", "schemas", "--config", "x.json"]).unwrap();
        assert_eq!(cli.command.name(), "schemas");
    }
}
