//! Okta Dynamic Client Registration client

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::IdpClient;
use crate::config::IdpConfig;
use crate::model::{ApplicationResponse, RotatedSecret};
use crate::translate::ClientRegistration;
use crate::error::FALLBACK_UPSTREAM_ERROR;
use crate::{Error, Result};

const CLIENTS_PATH: [&str; 3] = ["oauth2", "v1", "clients"];

/// Okta client-management API over `reqwest`.
#[derive(Clone)]
pub struct OktaClient {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for OktaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OktaClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl OktaClient {
    /// Build a client from configuration.
    ///
    /// The `Authorization` header (`<scheme> <token>`) and the JSON
    /// `Accept`/`Content-Type` headers are attached to every request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a bad base URL or token, or if the HTTP
    /// client cannot be built.
    pub fn new(config: &IdpConfig) -> Result<Self> {
        let base_url = config.parsed_base_url()?;

        let mut authorization =
            HeaderValue::try_from(format!("{} {}", config.auth_scheme, config.api_token))
                .map_err(|_| {
                    Error::Config("idp.api_token contains invalid header characters".to_string())
                })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Use a pre-built `reqwest` client. Headers are the caller's business.
    #[must_use]
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// `<base>/oauth2/v1/clients[/<segments>...]`, each segment escaped.
    fn clients_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(CLIENTS_PATH)
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl IdpClient for OktaClient {
    async fn create_client(&self, registration: &ClientRegistration) -> Result<ApplicationResponse> {
        let url = self.clients_url(&[])?;
        debug!(client_name = %registration.client_name, "Creating IdP client");

        let response = self
            .client
            .post(url)
            .json(registration)
            .send()
            .await
            .map_err(transport_error)?;

        decode(ensure_success(response).await?).await
    }

    async fn delete_client(&self, client_id: &str) -> Result<()> {
        let url = self.clients_url(&[client_id])?;
        debug!(client_id, "Deleting IdP client");

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn rotate_secret(&self, client_id: &str) -> Result<RotatedSecret> {
        let url = self.clients_url(&[client_id, "lifecycle", "newSecret"])?;
        debug!(client_id, "Rotating IdP client secret");

        let response = self
            .client
            .post(url)
            .json(&json!({}))
            .send()
            .await
            .map_err(transport_error)?;

        decode(ensure_success(response).await?).await
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    // reqwest errors carry the URL, never the headers
    Error::Transport(e.to_string())
}

/// Pass 2xx responses through; turn anything else into `Error::Upstream`.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (error, description) = upstream_error_fields(&text);
    Err(Error::Upstream {
        status: status.as_u16(),
        error,
        description,
    })
}

/// Decode a 2xx body. A body that does not fit `T` is `Error::UpstreamResponse`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::UpstreamResponse(e.to_string()))
}

/// Pick the error code and description out of an IdP error body.
///
/// Okta uses `errorCode`/`errorSummary`; OAuth2-style bodies use
/// `error`/`error_description`. Anything else is relayed as text.
fn upstream_error_fields(text: &str) -> (String, String) {
    let body: Value = serde_json::from_str(text).unwrap_or(Value::Null);
    let field = |names: [&str; 2]| {
        names
            .iter()
            .find_map(|name| {
                body.get(*name)
                    .and_then(Value::as_str)
                    .filter(|value| !value.trim().is_empty())
            })
            .map(str::to_string)
    };

    let error =
        field(["errorCode", "error"]).unwrap_or_else(|| FALLBACK_UPSTREAM_ERROR.to_string());
    let description = field(["errorSummary", "error_description"]).unwrap_or_else(|| {
        text.chars().take(500).collect()
    });
    (error, description)
}
