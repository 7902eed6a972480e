//! Konnect DCR bridge
//!
//! Registers Konnect applications as OAuth2 clients on an external IdP.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use dcr_bridge::{
    cli::{Cli, Command, PayloadKind},
    config::Config,
    gateway::Gateway,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::Validate { kind, ref file }) => run_validate(kind, file),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Check a payload file against a request schema
fn run_validate(kind: PayloadKind, file: &Path) -> ExitCode {
    let payload: Value = match std::fs::read(file)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
    {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {e}", file.display());
            return ExitCode::FAILURE;
        }
    };

    let result = kind.validate(&payload);
    if result.is_valid() {
        println!("✅ {} - valid", file.display());
        return ExitCode::SUCCESS;
    }

    println!("❌ {} - {} violation(s)", file.display(), result.violations.len());
    for violation in &result.violations {
        println!("   {violation}");
    }
    ExitCode::FAILURE
}

/// Run the HTTP service
async fn run_server(cli: Cli) -> ExitCode {
    let config = match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(host) = cli.host {
                config.server.host = host;
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        "Starting DCR bridge"
    );

    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
