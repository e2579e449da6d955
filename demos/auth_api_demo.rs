//! Auth API Demo
//!
//! Walks through a session login flow against the router in-process:
//! register, login, fetch the current user, logout.

use anyhow::{Context, Result};
use authgate::{
    api::{AppState, AuthApi},
    auth::AuthType,
    config::Config,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use std::time::Duration;
use tower::ServiceExt;
use tracing::info;

async fn call(state: &AppState, request: Request<Body>) -> Result<(StatusCode, Option<String>, String)> {
    let response = AuthApi::create_app(state.clone()).oneshot(request).await?;
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, cookie, String::from_utf8_lossy(&body).into_owned()))
}

fn form(method: Method, uri: &str, body: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Auth API Demo");

    let mut config = Config::default();
    config.auth.auth_type = AuthType::SessionWithExpiry;
    config.auth.session_duration = Duration::from_secs(300);
    let state = AppState::from_config(&config)?;

    let (status, _, body) = call(
        &state,
        form(Method::POST, "/api/v1/auth_session/register", "email=demo%40example.com&password=s3cret")?,
    )
    .await?;
    info!("register -> {} {}", status, body);

    let (status, cookie, body) = call(
        &state,
        form(Method::POST, "/api/v1/auth_session/login", "email=demo%40example.com&password=s3cret")?,
    )
    .await?;
    info!("login -> {} {}", status, body);
    let cookie = cookie.context("login did not set a session cookie")?;

    let me = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let (status, _, body) = call(&state, me).await?;
    info!("users/me -> {} {}", status, body);

    let logout = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v1/auth_session/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let (status, _, body) = call(&state, logout).await?;
    info!("logout -> {} {}", status, body);

    let me_again = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let (status, _, body) = call(&state, me_again).await?;
    info!("users/me after logout -> {} {}", status, body);

    Ok(())
}
