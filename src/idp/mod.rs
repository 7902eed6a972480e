//! Upstream identity provider abstraction
//!
//! The router only ever talks to an [`IdpClient`]. [`OktaClient`] is the
//! production implementation; tests substitute their own.
//!
//! ```text
//! Router ──▶ Arc<dyn IdpClient> ──▶ OktaClient ──▶ POST   oauth2/v1/clients
//!                                              ├─▶ DELETE oauth2/v1/clients/{id}
//!                                              └─▶ POST   oauth2/v1/clients/{id}/lifecycle/newSecret
//! ```

mod okta;

pub use okta::OktaClient;

use async_trait::async_trait;

use crate::Result;
use crate::model::{ApplicationResponse, RotatedSecret};
use crate::translate::ClientRegistration;

/// Client-management operations of a Dynamic Client Registration API.
///
/// Each call issues exactly one upstream request; nothing is retried.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can be
/// stored in `Arc<dyn IdpClient>` and shared across request tasks.
#[async_trait]
pub trait IdpClient: Send + Sync + 'static {
    /// Register a new client.
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` for a non-2xx answer, or a transport error.
    async fn create_client(&self, registration: &ClientRegistration) -> Result<ApplicationResponse>;

    /// Delete the client with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` for a non-2xx answer, or a transport error.
    async fn delete_client(&self, client_id: &str) -> Result<()>;

    /// Issue a new secret for the client with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` for a non-2xx answer, or a transport error.
    async fn rotate_secret(&self, client_id: &str) -> Result<RotatedSecret>;
}
