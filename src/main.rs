//! dtoschema CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments (via cli::run)
//! 2. Dispatches to CLI commands (via cli::run)
//! 3. Exits with non-zero on failure
//!
//! Failures are already written as an error response by the command layer.
//! All logic is delegated to the CLI module.

use dtoschema::cli;

fn main() {
    if cli::run().is_err() {
        std::process::exit(1);
    }
}
