//! HTTP surface: API-key gate, routes and server lifecycle

pub mod auth;
pub mod router;
mod server;

pub use auth::ApiKeyGate;
pub use router::{AppState, create_router};
pub use server::Gateway;
