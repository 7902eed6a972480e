//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, post},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use super::auth::{ApiKeyGate, api_key_middleware};
use crate::events::{AcknowledgeOnly, EventHookHandler};
use crate::idp::IdpClient;
use crate::model::{ApplicationPayload, ApplicationResponse, EventHook, SecretResponse};
use crate::schema::{SchemaValidationResult, definitions, validate};
use crate::translate::{ApplicationType, to_client_registration};
use crate::{Error, Result};

/// Shared application state
pub struct AppState {
    /// Upstream identity provider
    pub idp: Arc<dyn IdpClient>,
    /// Event hook reaction
    pub events: Arc<dyn EventHookHandler>,
    /// `application_type` registered for every client
    pub application_type: ApplicationType,
}

impl AppState {
    /// State with the acknowledge-only event handler.
    pub fn new(idp: Arc<dyn IdpClient>, application_type: ApplicationType) -> Self {
        Self {
            idp,
            events: Arc::new(AcknowledgeOnly),
            application_type,
        }
    }

    /// Replace the event hook handler.
    #[must_use]
    pub fn with_event_handler(mut self, events: Arc<dyn EventHookHandler>) -> Self {
        self.events = events;
        self
    }
}

/// Create the router
///
/// The API-key gate is a route layer: it runs for matched routes only and
/// before any body is read.
pub fn create_router(state: Arc<AppState>, gate: Arc<ApiKeyGate>) -> Router {
    Router::new()
        .route("/", post(create_application))
        .route("/{application_id}", delete(delete_application))
        .route("/{application_id}/new-secret", post(rotate_secret))
        .route("/{application_id}/event-hook", post(event_hook))
        .route_layer(middleware::from_fn_with_state(gate, api_key_middleware))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST / - register a new client upstream
async fn create_application(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApplicationResponse>)> {
    let payload: ApplicationPayload =
        parse_validated(&body, |v| validate(v, definitions::application_payload()))?;

    let registration = to_client_registration(&payload, state.application_type);
    let created = state.idp.create_client(&registration).await?;

    info!(
        client_id = %created.client_id,
        portal_id = %payload.portal_id,
        developer_id = %payload.developer_id,
        "Client created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /{application_id} - delete the upstream client
async fn delete_application(
    State(state): State<Arc<AppState>>,
    Path(application_id): Path<String>,
) -> Result<StatusCode> {
    state.idp.delete_client(&application_id).await?;

    info!(client_id = %application_id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /{application_id}/new-secret - rotate the client secret
async fn rotate_secret(
    State(state): State<Arc<AppState>>,
    Path(application_id): Path<String>,
) -> Result<Json<SecretResponse>> {
    let rotated = state.idp.rotate_secret(&application_id).await?;

    info!(client_id = %application_id, "Client secret rotated");
    Ok(Json(SecretResponse {
        client_id: application_id,
        client_secret: rotated.client_secret,
    }))
}

/// POST /{application_id}/event-hook - acknowledge a lifecycle event
async fn event_hook(
    State(state): State<Arc<AppState>>,
    Path(application_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    let hook: EventHook = parse_validated(&body, |v| definitions::event_hook().validate(v))?;

    state.events.handle(&application_id, &hook).await?;
    Ok(StatusCode::OK)
}

/// Parse `body` as JSON, check it against a schema, then decode it.
fn parse_validated<T, F>(body: &[u8], check: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(&Value) -> SchemaValidationResult,
{
    let value: Value =
        serde_json::from_slice(body).map_err(|e| Error::InvalidBody(e.to_string()))?;

    check(&value).into_result().map_err(Error::Validation)?;

    serde_json::from_value(value).map_err(|e| Error::InvalidBody(e.to_string()))
}
