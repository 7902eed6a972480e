//! Typed request and response bodies
//!
//! Bodies are schema-validated as raw JSON first (see [`crate::schema`]) and
//! only then decoded into these types, so decoding never has to produce
//! user-facing error messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Body of `POST /`: the application Konnect wants registered upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationPayload {
    /// Redirect URIs, in the order Konnect sent them
    pub redirect_uris: Vec<String>,
    /// Display name of the client
    pub client_name: String,
    /// Requested grant types (open vocabulary)
    pub grant_types: Vec<String>,
    /// Requested scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Token endpoint auth method, e.g. `client_secret_post`
    pub token_endpoint_auth_method: String,
    /// Free-form description
    pub application_description: String,
    /// Konnect portal
    pub portal_id: Uuid,
    /// Konnect organization
    pub organization_id: Uuid,
    /// Konnect developer owning the application
    pub developer_id: Uuid,
    /// Konnect auth strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_strategy_id: Option<Uuid>,
    /// Konnect DCR provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcr_provider_id: Option<Uuid>,
}

/// Issue/expiry instant as reported by the IdP.
///
/// Okta reports epoch seconds; other providers use RFC 3339 strings. The
/// value is relayed to Konnect untouched, whatever its JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Seconds since the Unix epoch
    Epoch(i64),
    /// Date-time text
    Text(String),
    /// Any other JSON value, e.g. fractional seconds
    Other(Value),
}

/// Credentials of a freshly created client.
///
/// Returned once to Konnect and never stored. Any other field the IdP sends
/// is dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationResponse {
    /// Client ID assigned by the IdP
    pub client_id: String,
    /// When the client ID was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id_issued_at: Option<Timestamp>,
    /// Client secret; absent for public clients (`token_endpoint_auth_method: none`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// When the secret expires (`0` = never, for Okta)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_expires_at: Option<Timestamp>,
}

/// Secret returned by the IdP's rotate-secret lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RotatedSecret {
    /// The new secret
    pub client_secret: String,
}

/// Body of `POST /{application_id}/new-secret` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretResponse {
    /// The path-supplied client ID
    pub client_id: String,
    /// The new secret
    pub client_secret: String,
}

/// Application lifecycle notification sent by Konnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHook {
    /// Fields shared by every event type
    #[serde(flatten)]
    pub application: EventApplication,
    /// Event-specific fields, selected by `event_type`
    #[serde(flatten)]
    pub event: Event,
}

/// Application fields common to all event hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventApplication {
    /// Client ID in the IdP
    pub client_id: String,
    /// Application ID in Konnect
    pub application_id: Uuid,
    /// Application name
    pub application_name: String,
    /// Application description
    pub application_description: String,
    /// Konnect portal
    pub portal_id: Uuid,
    /// Konnect organization
    pub organization_id: Uuid,
    /// Konnect developer, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<Uuid>,
}

/// Event variants, keyed by `event_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    /// The application was edited in Konnect
    UpdateApplication {
        /// Sent by older Konnect releases only
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redirect_uris: Option<Vec<String>>,
    },
    /// The application was registered to an API product version
    AddRegistration(Registration),
    /// The application was unregistered from an API product version
    RemoveRegistration(Registration),
}

impl Event {
    /// Wire name of the event type
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UpdateApplication { .. } => "update_application",
            Self::AddRegistration(_) => "add_registration",
            Self::RemoveRegistration(_) => "remove_registration",
        }
    }
}

/// Registration details carried by add/remove registration events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// API product version the application is (un)registered to
    pub api_product_version_id: Uuid,
    /// Audience of the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}
