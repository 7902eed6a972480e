//! Konnect DCR Bridge Library
//!
//! Backend-for-frontend that lets Konnect manage OAuth2 client credentials on
//! an external Identity Provider through its Dynamic Client Registration API.
//!
//! # Features
//!
//! - **Create / delete / rotate**: one inbound call maps to one upstream IdP call
//! - **Strict validation**: inbound bodies are checked against declarative schemas
//! - **API-key gate**: every route is protected by `x-api-key`, with key rotation
//! - **Event hooks**: application lifecycle notifications are acknowledged
//!
//! # Routes
//!
//! | Method | Path | Upstream |
//! |--------|------|----------|
//! | `POST` | `/` | create client |
//! | `DELETE` | `/{application_id}` | delete client |
//! | `POST` | `/{application_id}/new-secret` | rotate secret |
//! | `POST` | `/{application_id}/event-hook` | none |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod idp;
pub mod model;
pub mod schema;
pub mod translate;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
