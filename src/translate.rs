//! Konnect application → IdP client registration mapping
//!
//! Only the fields the IdP needs are forwarded. Konnect identifiers
//! (`portal_id`, `organization_id`, `developer_id`, ...) never leave this
//! service.
//!
//! # Grant policy
//!
//! | Requested grants | Upstream `grant_types` | Upstream `response_types` |
//! |------------------|------------------------|---------------------------|
//! | contains `client_credentials` or `bearer` | `client_credentials` | `token` |
//! | anything else | requested, de-duplicated | `code`, `token`, `id_token` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ApplicationPayload;

/// Grants that mark a machine-to-machine application.
pub const CREDENTIAL_GRANTS: &[&str] = &["client_credentials", "bearer"];

/// Response types registered for interactive (non credential-style) clients.
pub const INTERACTIVE_RESPONSE_TYPES: &[&str] = &["code", "token", "id_token"];

/// OAuth2 `application_type` sent upstream.
///
/// Fixed per deployment, never taken from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    /// Browser-based application
    Web,
    /// Machine-to-machine service
    #[default]
    Service,
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("web"),
            Self::Service => f.write_str("service"),
        }
    }
}

/// Client registration request in the IdP's DCR shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRegistration {
    /// Display name
    pub client_name: String,
    /// Redirect URIs, order preserved
    pub redirect_uris: Vec<String>,
    /// Derived response types
    pub response_types: Vec<String>,
    /// Derived grant types
    pub grant_types: Vec<String>,
    /// Token endpoint auth method
    pub token_endpoint_auth_method: String,
    /// Deployment-wide application type
    pub application_type: ApplicationType,
}

/// Map a validated payload to the upstream registration request.
#[must_use]
pub fn to_client_registration(
    payload: &ApplicationPayload,
    application_type: ApplicationType,
) -> ClientRegistration {
    let (grant_types, response_types) = derive_grants(&payload.grant_types);

    ClientRegistration {
        client_name: payload.client_name.clone(),
        redirect_uris: payload.redirect_uris.clone(),
        response_types,
        grant_types,
        token_endpoint_auth_method: payload.token_endpoint_auth_method.clone(),
        application_type,
    }
}

/// Apply the grant policy, returning `(grant_types, response_types)`.
#[must_use]
pub fn derive_grants(requested: &[String]) -> (Vec<String>, Vec<String>) {
    let credential_style = requested
        .iter()
        .any(|g| CREDENTIAL_GRANTS.contains(&g.as_str()));

    if credential_style {
        return (
            vec!["client_credentials".to_string()],
            vec!["token".to_string()],
        );
    }

    let mut grants: Vec<String> = Vec::with_capacity(requested.len());
    for grant in requested {
        if !grants.contains(grant) {
            grants.push(grant.clone());
        }
    }

    let response_types = INTERACTIVE_RESPONSE_TYPES
        .iter()
        .map(|&r| r.to_string())
        .collect();

    (grants, response_types)
}
