//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Schemas
    /// A schema definition was registered
    SchemaRegistered,
    /// Declaration files loaded from a schema directory
    SchemasLoaded,

    // Instances
    /// An instance passed construction
    InstanceConstructed,
    /// Construction failed and no instance was returned
    ConstructionRejected,

    // Commands
    /// A CLI command finished
    CommandComplete,
    /// A CLI command failed
    CommandFailed,
}

impl Event {
    /// Returns the event name as written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::InstanceConstructed => "INSTANCE_CONSTRUCTED",
            Event::ConstructionRejected => "CONSTRUCTION_REJECTED",
            Event::CommandComplete => "COMMAND_COMPLETE",
            Event::CommandFailed => "COMMAND_FAILED",
        }
    }

    /// Returns the severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            // One line per instance is too chatty for the default level
            Event::InstanceConstructed | Event::ConstructionRejected => Severity::Trace,
            Event::CommandFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
