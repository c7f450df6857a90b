//! CLI module for dtoschema
//!
//! Provides command-line interface for:
//! - schemas: List declared schemas
//! - construct: Build an instance from a JSON document
//! - conforms: Check a JSON document against a schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{conforms, construct, run, run_command, schemas, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_document, write_error, write_response};
