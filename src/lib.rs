//! AuthGate Library
//!
//! Pluggable request authentication layer for HTTP APIs.
//!
//! Every inbound request is classified as anonymous, authenticated or rejected
//! by one of three interchangeable strategies: no authentication, HTTP Basic,
//! or server-side session cookies (optionally expiring, optionally persisted).

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod session;
pub mod shutdown;
pub mod storage;
pub mod users;

pub use auth::{AuthGate, AuthRequest, AuthStrategy, AuthVerdict, ExclusionPolicy};
pub use config::Config;
pub use session::{DurableSessionStore, SessionStore, VolatileSessionStore};
pub use shutdown::ShutdownCoordinator;

/// Common error type for application edges (config loading, server startup)
pub type Result<T> = anyhow::Result<T>;
