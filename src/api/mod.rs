//! API Module
//!
//! axum HTTP surface: status routes, session login/logout, password reset
//! and the current-user endpoint, all behind the authentication gate.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::AuthApi;
pub use server::AuthServer;
pub use types::ApiError;
