//! Application lifecycle event hooks
//!
//! Konnect notifies the bridge when an application is updated or its API
//! product registrations change. The bridge currently keeps nothing in sync
//! with the IdP, so the default handler only acknowledges the event.

use async_trait::async_trait;
use tracing::info;

use crate::Result;
use crate::model::{Event, EventHook};

/// Reaction to a validated event hook.
#[async_trait]
pub trait EventHookHandler: Send + Sync + 'static {
    /// Handle `event` for the application named in the request path.
    ///
    /// # Errors
    ///
    /// An error is rendered to Konnect like any other failure.
    async fn handle(&self, application_id: &str, event: &EventHook) -> Result<()>;
}

/// Logs the event and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcknowledgeOnly;

#[async_trait]
impl EventHookHandler for AcknowledgeOnly {
    async fn handle(&self, application_id: &str, event: &EventHook) -> Result<()> {
        let api_product_version_id = match &event.event {
            Event::AddRegistration(r) | Event::RemoveRegistration(r) => {
                Some(r.api_product_version_id)
            }
            Event::UpdateApplication { .. } => None,
        };

        info!(
            application_id,
            client_id = %event.application.client_id,
            event_type = event.event.event_type(),
            api_product_version_id = ?api_product_version_id,
            "Event hook acknowledged"
        );
        Ok(())
    }
}
