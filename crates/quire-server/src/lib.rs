//! HTTP adapter for Quire.
//!
//! Exposes the producer API (publish, lookup, delete behind a bearer token)
//! and the reader routes (document, unlock, images) over axum. All storage
//! and access decisions are delegated to `quire-store` and `quire-gate`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use auth::{AuthProvider, Credentials, Identity, StaticTokenAuth};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::QuireServer;
pub use session::{SessionRegistry, SESSION_COOKIE};
pub use state::AppState;
