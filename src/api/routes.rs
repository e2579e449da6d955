//! API Routes

use super::{handlers::*, middleware::auth_gate_middleware};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::Layer;
use tower_http::{cors::CorsLayer, normalize_path::NormalizePath, normalize_path::NormalizePathLayer};

/// HTTP API router
pub struct AuthApi;

impl AuthApi {
    /// Create the API router; every route passes through the authentication gate
    pub fn create_router(state: AppState) -> Router {
        let routes = Router::new()
            .route("/status", get(status))
            .route("/stats", get(stats))
            .route("/unauthorized", get(unauthorized))
            .route("/forbidden", get(forbidden))
            .route("/auth_session/register", post(register))
            .route("/auth_session/login", post(login))
            .route("/auth_session/logout", delete(logout))
            .route(
                "/auth_session/reset_password",
                post(get_reset_password_token).put(update_password),
            )
            .route("/users/me", get(me));

        Router::new()
            .nest("/api/v1", routes)
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), auth_gate_middleware))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Router with trailing slashes trimmed before routing
    pub fn create_app(state: AppState) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(Self::create_router(state))
    }
}
