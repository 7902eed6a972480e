//! API-key gate
//!
//! Every route requires the configured header (`x-api-key` by default) to
//! hold one of the accepted keys. Several keys may be active at once so
//! Konnect can rotate its key without downtime.
//!
//! Rejections always carry the same body and never reveal which keys exist.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::{Choice, ConstantTimeEq};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::{Error, Result};

/// Accepted API keys and the header that carries them.
pub struct ApiKeyGate {
    header: HeaderName,
    keys: Vec<String>,
}

impl fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("header", &self.header)
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .finish()
    }
}

impl ApiKeyGate {
    /// Create a gate accepting `keys` in `header`. Blank keys are ignored.
    pub fn new<I, K>(header: HeaderName, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys = keys
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.trim().is_empty())
            .collect();
        Self { header, keys }
    }

    /// Create the gate from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid header name or an empty key set.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let header = HeaderName::try_from(config.header.as_str())
            .map_err(|e| Error::Config(format!("Invalid auth.header '{}': {e}", config.header)))?;
        let gate = Self::new(header, config.api_keys.iter().cloned());
        if gate.keys.is_empty() {
            return Err(Error::Config("No API keys configured".to_string()));
        }
        Ok(gate)
    }

    /// Header the key is read from
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Number of accepted keys
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Whether `presented` is one of the accepted keys.
    ///
    /// Every key is compared in constant time, so timing does not reveal
    /// which key (if any) matched.
    #[must_use]
    pub fn accepts(&self, presented: &str) -> bool {
        let matched = self
            .keys
            .iter()
            .fold(Choice::from(0), |acc, key| {
                acc | key.as_bytes().ct_eq(presented.as_bytes())
            });
        bool::from(matched)
    }

    /// Whether the request headers carry an accepted key.
    /// A missing or non-UTF-8 header is rejected.
    #[must_use]
    pub fn is_allowed(&self, headers: &HeaderMap) -> bool {
        headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|presented| self.accepts(presented))
    }
}

/// API-key middleware, run before any extractor of a gated route.
pub async fn api_key_middleware(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if gate.is_allowed(request.headers()) {
        debug!(method = %request.method(), path = %request.uri().path(), "API key accepted");
        return next.run(request).await;
    }

    let present = request.headers().contains_key(&gate.header);
    warn!(
        method = %request.method(),
        path = %request.uri().path(),
        header_present = present,
        "Rejected request: wrong API key"
    );
    Error::Unauthorized.into_response()
}
