//! Error types for the DCR bridge
//!
//! Every failure leaves the service as the same JSON body:
//!
//! ```json
//! { "error": "<name>", "error_description": "<text or violation list>" }
//! ```

use std::io;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::schema::Violation;

/// Result type alias for the DCR bridge
pub type Result<T> = std::result::Result<T, Error>;

/// Error identifier returned for a rejected `x-api-key`.
pub const WRONG_API_KEY: &str = "Wrong API-Key";

/// Description returned for a rejected `x-api-key`.
pub const WRONG_API_KEY_DESCRIPTION: &str = "wrong x-api-key header";

/// `error` value when the IdP gave no usable error code.
pub const FALLBACK_UPSTREAM_ERROR: &str = "Upstream Error";

/// DCR bridge errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or unknown API key
    #[error("Wrong API-Key")]
    Unauthorized,

    /// Request body failed schema validation
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<Violation>),

    /// Request body is not JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// IdP answered with a non-success status
    #[error("Upstream error {status}: {error}: {description}")]
    Upstream {
        /// HTTP status the IdP answered with
        status: u16,
        /// Upstream error code
        error: String,
        /// Upstream error description
        description: String,
    },

    /// IdP could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IdP answered 2xx with a body that could not be decoded
    #[error("Invalid upstream response: {0}")]
    UpstreamResponse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Short error name placed in the `error` field of the response body.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unauthorized => WRONG_API_KEY,
            Self::Validation(_) | Self::InvalidBody(_) => "Bad Request",
            Self::Upstream { error, .. } if error.trim().is_empty() => FALLBACK_UPSTREAM_ERROR,
            Self::Upstream { error, .. } => error.as_str(),
            Self::Transport(_) => "Upstream Unavailable",
            Self::UpstreamResponse(_) => "Invalid Upstream Response",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => "Internal Error",
        }
    }

    /// HTTP status this error is answered with.
    ///
    /// Upstream 4xx/5xx statuses pass through; anything without a usable
    /// status falls back to 400.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_REQUEST),
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing `error_description`. Never carries internal detail.
    fn description(&self) -> Value {
        match self {
            Self::Unauthorized => Value::from(WRONG_API_KEY_DESCRIPTION),
            Self::Validation(violations) => json!(violations),
            Self::InvalidBody(reason) => Value::from(format!("body must be JSON: {reason}")),
            Self::Upstream { description, .. } => Value::from(description.as_str()),
            Self::Transport(_) => Value::from("identity provider request failed"),
            Self::UpstreamResponse(_) => {
                Value::from("identity provider response could not be read")
            }
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => {
                Value::from("request could not be processed")
            }
        }
    }

    /// Uniform error body.
    #[must_use]
    pub fn body(&self) -> Value {
        json!({
            "error": self.name(),
            "error_description": self.description(),
        })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Unauthorized | Self::Validation(_) | Self::InvalidBody(_) => {
                tracing::debug!(status = status.as_u16(), "Request rejected: {self}");
            }
            Self::Upstream { status: upstream, .. } => {
                tracing::warn!(upstream_status = upstream, "Identity provider error: {self}");
            }
            _ => {
                tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
            }
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{definitions, validate};
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    async fn render(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_has_fixed_body() {
        let (status, body) = render(Error::Unauthorized).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            json!({ "error": "Wrong API-Key", "error_description": "wrong x-api-key header" })
        );
    }

    #[tokio::test]
    async fn validation_lists_violations() {
        // GIVEN: an empty application payload
        let violations = validate(&json!({}), definitions::application_payload()).violations;

        // WHEN: rendered
        let (status, body) = render(Error::Validation(violations)).await;

        // THEN: 400 with the first missing property named
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(
            body["error_description"][0]["params"]["missingProperty"],
            "redirect_uris"
        );
        assert_eq!(body["error_description"][0]["keyword"], "required");
        assert_eq!(body["error_description"][0]["instancePath"], "");
    }

    #[tokio::test]
    async fn upstream_status_passes_through() {
        let (status, body) = render(Error::Upstream {
            status: 404,
            error: "E0000007".to_string(),
            description: "Not found: Resource not found: abc (AppInstance)".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "E0000007");
        assert_eq!(
            body["error_description"],
            "Not found: Resource not found: abc (AppInstance)"
        );
    }

    #[tokio::test]
    async fn upstream_server_error_passes_through() {
        let (status, _) = render(Error::Upstream {
            status: 503,
            error: "Upstream Error".to_string(),
            description: "unavailable".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn upstream_non_error_status_defaults_to_bad_request() {
        let error = Error::Upstream {
            status: 302,
            error: "Upstream Error".to_string(),
            description: String::new(),
        };
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (status, body) = render(Error::Internal("token=SSWS abc123".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Internal Error");
        assert!(!body.to_string().contains("abc123"));
    }

    #[tokio::test]
    async fn transport_failure_is_generic() {
        let (status, body) = render(Error::Transport("connection refused".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Upstream Unavailable");
        assert_eq!(body["error_description"], "identity provider request failed");
    }

    #[tokio::test]
    async fn undecodable_success_body_has_its_own_name() {
        let (status, body) =
            render(Error::UpstreamResponse("missing field `client_id`".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid Upstream Response");
        assert_eq!(
            body["error_description"],
            "identity provider response could not be read"
        );
    }

    #[tokio::test]
    async fn blank_upstream_code_falls_back() {
        let (status, body) = render(Error::Upstream {
            status: 400,
            error: String::new(),
            description: "bad".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Upstream Error");
    }

    #[test]
    fn validation_display_summarizes() {
        let violations = validate(&json!({}), definitions::application_payload()).violations;
        let text = Error::Validation(violations).to_string();
        assert!(text.starts_with("Validation failed: /: must have required property 'redirect_uris'"));
    }
}
