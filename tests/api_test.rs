//! HTTP API Integration Tests

use anyhow::Result;
use authgate::api::{AppState, AuthApi};
use authgate::auth::AuthType;
use authgate::config::{Config, UserSeed};
use authgate::credentials::CredentialCodec;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const COOKIE: &str = "_my_session_id";

fn config(auth_type: AuthType) -> Config {
    let mut config = Config::default();
    config.auth.auth_type = auth_type;
    config.users.seed = vec![UserSeed {
        email: "bob@hbtn.io".to_string(),
        password: "H0lberton".to_string(),
    }];
    config
}

fn state(auth_type: AuthType) -> AppState {
    AppState::from_config(&config(auth_type)).unwrap()
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response: Response = AuthApi::create_app(state.clone())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(uri: &str, method: Method, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// `name=value` from a `Set-Cookie` header
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_public_routes() {
    let state = state(AuthType::Session);

    let (status, _, body) = send(&state, get("/api/v1/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");

    let (status, _, _) = send(&state, get("/api/v1/status/")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&state, get("/api/v1/unauthorized")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _, body) = send(&state, get("/api/v1/forbidden/")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn test_protected_route_without_credentials() {
    let state = state(AuthType::Session);
    let (status, _, body) = send(&state, get("/api/v1/stats")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _, _) = send(
        &state,
        with_cookie("/api/v1/users/me", Method::GET, &format!("{}=nope", COOKIE)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_auth_lets_everything_through() {
    let state = state(AuthType::None);

    let (status, _, body) = send(&state, get("/api/v1/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], 1);

    // Nobody is identified, so there is no "me"
    let (status, _, _) = send(&state, get("/api/v1/users/me")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&state, get("/api/v1/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_session_login_me_logout() {
    let state = state(AuthType::Session);

    let (status, _, body) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/login", "email=bob%40hbtn.io&password=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong password");

    let (status, _, _) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/login", "email=who%40hbtn.io&password=x"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/login/", "password=x"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email missing");

    let (status, set_cookie, body) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/login", "email=bob%40hbtn.io&password=H0lberton"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");
    assert!(body.get("hashed_password").is_none());
    let set_cookie = set_cookie.expect("login sets the session cookie");
    assert!(set_cookie.starts_with(&format!("{}=", COOKIE)));
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = cookie_pair(&set_cookie);

    let (status, _, body) = send(&state, with_cookie("/api/v1/users/me", Method::GET, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");

    let (status, _, body) = send(
        &state,
        with_cookie("/api/v1/auth_session/logout", Method::DELETE, &cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({}));

    let (status, _, _) = send(&state, with_cookie("/api/v1/users/me", Method::GET, &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_basic_auth_routes() {
    let state = state(AuthType::Basic);
    let authorized = |uri: &str, header_value: String| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, header_value)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, body) = send(
        &state,
        authorized(
            "/api/v1/users/me",
            CredentialCodec::encode_header("bob@hbtn.io", "H0lberton"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");

    let (status, _, body) = send(
        &state,
        authorized("/api/v1/users/me", CredentialCodec::encode_header("bob@hbtn.io", "nope")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _, _) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/login", "email=bob%40hbtn.io&password=H0lberton"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_register_and_password_reset() {
    let state = state(AuthType::SessionWithExpiry);

    let (status, _, body) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/register", "email=new%40hbtn.io&password=first"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "new@hbtn.io");
    assert_eq!(body["message"], "user created");

    let (status, _, body) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/register", "email=new%40hbtn.io&password=again"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "email already registered");

    let (status, _, _) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/reset_password", "email=ghost%40hbtn.io"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/reset_password", "email=new%40hbtn.io"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["reset_token"].as_str().expect("token").to_string();

    let (status, _, _) = send(
        &state,
        form(
            Method::PUT,
            "/api/v1/auth_session/reset_password",
            "email=new%40hbtn.io&reset_token=bogus&new_password=second",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // a valid token presented for another account
    let (status, _, _) = send(
        &state,
        form(
            Method::PUT,
            "/api/v1/auth_session/reset_password",
            &format!("email=other%40hbtn.io&reset_token={}&new_password=second", token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(
        &state,
        form(
            Method::PUT,
            "/api/v1/auth_session/reset_password",
            &format!("email=new%40hbtn.io&reset_token={}&new_password=second", token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated");

    let (status, _, _) = send(
        &state,
        form(Method::POST, "/api/v1/auth_session/login", "email=new%40hbtn.io&password=second"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_live_session() {
    let state = state(AuthType::Session);
    let (status, _, _) = send(
        &state,
        with_cookie("/api/v1/auth_session/logout", Method::DELETE, "theme=dark"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_db_sessions_survive_restart() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = config(AuthType::SessionWithDb);
    config.auth.session_duration = Duration::from_secs(3600);
    config.auth.session_store_path = Some(dir.path().join("sessions.json"));
    config.users.store_path = Some(dir.path().join("users.json"));

    let first = AppState::from_config(&config)?;
    let (status, set_cookie, _) = send(
        &first,
        form(Method::POST, "/api/v1/auth_session/login", "email=bob%40hbtn.io&password=H0lberton"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie_pair(&set_cookie.expect("session cookie"));
    drop(first);

    let second = AppState::from_config(&config)?;
    let (status, _, body) = send(&second, with_cookie("/api/v1/users/me", Method::GET, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");
    assert_eq!(second.accounts.users().count()?, 1);
    Ok(())
}
