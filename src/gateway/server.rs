//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::auth::ApiKeyGate;
use super::router::{AppState, create_router};
use crate::config::Config;
use crate::idp::{IdpClient, OktaClient};
use crate::{Error, Result};

/// DCR bridge server
pub struct Gateway {
    /// Configuration
    config: Config,
    /// Handler state
    state: Arc<AppState>,
    /// API-key gate
    gate: Arc<ApiKeyGate>,
}

impl Gateway {
    /// Create a gateway talking to the configured Okta org.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is incomplete.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let idp: Arc<dyn IdpClient> = Arc::new(OktaClient::new(&config.idp)?);
        Self::with_idp(config, idp)
    }

    /// Create a gateway with an explicit IdP client.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no API key is configured.
    pub fn with_idp(config: Config, idp: Arc<dyn IdpClient>) -> Result<Self> {
        let gate = Arc::new(ApiKeyGate::from_config(&config.auth)?);
        let state = Arc::new(AppState::new(idp, config.idp.application_type));
        Ok(Self {
            config,
            state,
            gate,
        })
    }

    /// The full application, body limit included.
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state), Arc::clone(&self.gate))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
    }

    /// Run the gateway until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            host = %self.config.server.host,
            port = self.config.server.port,
            "DCR bridge listening"
        );
        info!(
            idp = %self.config.idp.base_url,
            application_type = %self.config.idp.application_type,
            api_keys = self.gate.key_count(),
            header = %self.gate.header(),
            "Upstream identity provider configured"
        );
        if self.config.idp.timeout.is_none() {
            warn!("No idp.timeout configured; upstream calls use the HTTP client default");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
