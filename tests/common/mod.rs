//! Shared fixtures for router tests: a recording IdP stub and request helpers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use dcr_bridge::config::Config;
use dcr_bridge::gateway::Gateway;
use dcr_bridge::idp::IdpClient;
use dcr_bridge::model::{ApplicationResponse, RotatedSecret, Timestamp};
use dcr_bridge::translate::ClientRegistration;
use dcr_bridge::{Error, Result};

pub const KEYS: [&str; 2] = ["key-current", "key-previous"];

/// One call the router made on the IdP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdpCall {
    Create(ClientRegistration),
    Delete(String),
    Rotate(String),
}

/// How the stub answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok,
    Upstream { status: u16, error: String, description: String },
}

/// `IdpClient` that records calls and answers from fixed data.
pub struct RecordingIdp {
    calls: Mutex<Vec<IdpCall>>,
    reply: Reply,
    created: ApplicationResponse,
}

impl RecordingIdp {
    pub fn new() -> Self {
        Self::with_reply(Reply::Ok)
    }

    pub fn with_reply(reply: Reply) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply,
            created: ApplicationResponse {
                client_id: "id".to_string(),
                client_id_issued_at: Some(Timestamp::Epoch(1_700_825_336)),
                client_secret: Some("secret".to_string()),
                client_secret_expires_at: Some(Timestamp::Epoch(0)),
            },
        }
    }

    pub fn failing(status: u16, error: &str, description: &str) -> Self {
        Self::with_reply(Reply::Upstream {
            status,
            error: error.to_string(),
            description: description.to_string(),
        })
    }

    pub fn calls(&self) -> Vec<IdpCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: IdpCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.reply {
            Reply::Ok => Ok(()),
            Reply::Upstream { status, error, description } => Err(Error::Upstream {
                status: *status,
                error: error.clone(),
                description: description.clone(),
            }),
        }
    }
}

#[async_trait]
impl IdpClient for RecordingIdp {
    async fn create_client(&self, registration: &ClientRegistration) -> Result<ApplicationResponse> {
        self.record(IdpCall::Create(registration.clone()))?;
        Ok(self.created.clone())
    }

    async fn delete_client(&self, client_id: &str) -> Result<()> {
        self.record(IdpCall::Delete(client_id.to_string()))
    }

    async fn rotate_secret(&self, client_id: &str) -> Result<RotatedSecret> {
        self.record(IdpCall::Rotate(client_id.to_string()))?;
        Ok(RotatedSecret {
            client_secret: "secret".to_string(),
        })
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.auth.api_keys = KEYS.iter().map(|k| (*k).to_string()).collect();
    config.idp.base_url = "https://example.okta.com".to_string();
    config.idp.api_token = "token".to_string();
    config
}

/// Router wired to `idp`, with the production body limit.
pub fn app_with(config: Config, idp: Arc<RecordingIdp>) -> Router {
    Gateway::with_idp(config, idp).unwrap().router()
}

pub fn app(idp: Arc<RecordingIdp>) -> Router {
    app_with(config(), idp)
}

/// Send one request; returns status and the raw body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    api_key: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

pub fn application_payload() -> Value {
    json!({
        "redirect_uris": ["https://example.com"],
        "client_name": "test",
        "grant_types": ["authorization_code", "refresh_token", "implicit"],
        "token_endpoint_auth_method": "client_secret_post",
        "application_description": "disisatest",
        "portal_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2705",
        "organization_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2706",
        "developer_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2707"
    })
}

pub fn event_hook(event_type: &str) -> Value {
    let mut hook = json!({
        "event_type": event_type,
        "client_id": "id",
        "application_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        "application_name": "name",
        "application_description": "description",
        "portal_id": "3fa85f64-5717-4562-b3fc-2c963f66afa7",
        "organization_id": "3fa85f64-5717-4562-b3fc-2c963f66afa8",
        "developer_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2707"
    });
    if event_type != "update_application" {
        hook["api_product_version_id"] = json!("3fa85f64-5717-4562-b3fc-2c963f66afa9");
        hook["audience"] = json!("audience");
    }
    hook
}
