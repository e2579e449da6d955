//! Authentication Middleware
//!
//! Runs the [`AuthGate`](crate::auth::AuthGate) in front of every route and
//! attaches the [`CurrentUser`](crate::auth::CurrentUser) for handlers.

use super::handlers::AppState;
use super::types::ApiError;
use crate::auth::{AuthRequest, AuthVerdict};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Framework-independent view of an axum request
pub fn auth_request_from(path: &str, headers: &HeaderMap) -> AuthRequest {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .fold(AuthRequest::new(path), |request, (name, value)| {
            request.with_header(name, value)
        })
}

/// Authentication middleware function
pub async fn auth_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_request = auth_request_from(request.uri().path(), request.headers());
    let gate = state.gate.clone();

    // Durable session lookups do blocking file I/O
    let verdict = match tokio::task::spawn_blocking(move || gate.authenticate(&auth_request)).await {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => return ApiError::from(e).into_response(),
        Err(e) => {
            error!("Authentication task failed: {}", e);
            return ApiError::Internal.into_response();
        }
    };

    match verdict {
        AuthVerdict::Anonymous => next.run(request).await,
        AuthVerdict::Authenticated(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        AuthVerdict::Rejected(reason) => ApiError::from(reason).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_auth_request_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        headers.append("cookie", HeaderValue::from_static("sid=first; theme=dark"));
        headers.append("cookie", HeaderValue::from_static("sid=second"));

        let request = auth_request_from("/api/v1/users/me", &headers);
        assert_eq!(request.path(), "/api/v1/users/me");
        assert_eq!(request.header("Authorization"), Some("Basic abc"));
        assert_eq!(request.cookie("sid"), Some("first"));
        assert_eq!(request.cookie("theme"), Some("dark"));
    }
}
