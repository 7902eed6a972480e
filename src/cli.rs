//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::schema::{SchemaValidationResult, definitions, validate};

/// Konnect DCR bridge - registers Konnect applications as IdP OAuth2 clients
#[derive(Parser, Debug)]
#[command(name = "dcr-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "DCR_BRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "DCR_BRIDGE_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "DCR_BRIDGE_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "DCR_BRIDGE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "DCR_BRIDGE_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP service (default)
    Serve,

    /// Check a JSON payload against a request schema without calling the IdP
    Validate {
        /// Which request body the file holds
        #[arg(value_enum)]
        kind: PayloadKind,

        /// Path to the JSON file
        #[arg(required = true)]
        file: PathBuf,
    },
}

/// Request bodies that have a schema.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    /// `POST /` body
    Application,
    /// `POST /{application_id}/event-hook` body
    EventHook,
}

impl PayloadKind {
    /// Validate `payload` against this kind's schema.
    #[must_use]
    pub fn validate(self, payload: &Value) -> SchemaValidationResult {
        match self {
            Self::Application => validate(payload, definitions::application_payload()),
            Self::EventHook => definitions::event_hook().validate(payload),
        }
    }
}
