//! API Handlers

use super::middleware::auth_request_from;
use super::types::*;
use crate::accounts::{AccountError, AccountService};
use crate::auth::{AuthGate, CurrentUser};
use crate::users::UserView;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::error;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub accounts: Arc<AccountService>,
    pub start_time: SystemTime,
}

/// Run an account operation off the async workers; hashing and file I/O block
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&AccountService) -> Result<T, AccountError> + Send + 'static,
    T: Send + 'static,
{
    let accounts = state.accounts.clone();
    match tokio::task::spawn_blocking(move || op(&accounts)).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!("Account task failed: {}", e);
            Err(ApiError::Internal)
        }
    }
}

fn field(value: Option<String>, name: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingField(name))
}

/// GET /status
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
    })
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let users = blocking(&state, |accounts| Ok(accounts.users().count()?)).await?;
    Ok(Json(StatsResponse { users }))
}

/// GET /unauthorized
pub async fn unauthorized() -> ApiError {
    ApiError::Unauthorized
}

/// GET /forbidden
pub async fn forbidden() -> ApiError {
    ApiError::Forbidden
}

/// Unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// POST /auth_session/register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<(StatusCode, Json<AccountMessage>), ApiError> {
    let email = field(form.email, "email")?;
    let password = field(form.password, "password")?;

    let user = blocking(&state, move |accounts| accounts.register(&email, &password)).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountMessage {
            email: user.email,
            message: "user created".to_string(),
        }),
    ))
}

/// POST /auth_session/login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let email = field(form.email, "email")?;
    let password = field(form.password, "password")?;

    let cookie_name = state
        .gate
        .strategy()
        .sessions()
        .map(|sessions| sessions.cookie_name().to_string())
        .ok_or(ApiError::SessionsDisabled)?;

    let (user, session_id) =
        blocking(&state, move |accounts| accounts.login(&email, &password)).await?;

    let cookie = format!("{}={}; Path=/; HttpOnly", cookie_name, session_id);
    Ok(([(header::SET_COOKIE, cookie)], Json(user.view())).into_response())
}

/// DELETE /auth_session/logout
pub async fn logout(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = auth_request_from(uri.path(), &headers);
    blocking(&state, move |accounts| accounts.logout(&request)).await?;
    Ok(Json(serde_json::json!({})))
}

/// POST /auth_session/reset_password
pub async fn get_reset_password_token(
    State(state): State<AppState>,
    Form(form): Form<ResetRequestForm>,
) -> Result<Json<ResetTokenResponse>, ApiError> {
    let email = field(form.email, "email")?;

    let lookup = email.clone();
    let reset_token = blocking(&state, move |accounts| {
        accounts.get_reset_password_token(&lookup)
    })
    .await?;

    Ok(Json(ResetTokenResponse { email, reset_token }))
}

/// PUT /auth_session/reset_password
pub async fn update_password(
    State(state): State<AppState>,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Json<AccountMessage>, ApiError> {
    let email = field(form.email, "email")?;
    let reset_token = field(form.reset_token, "reset_token")?;
    let new_password = field(form.new_password, "new_password")?;

    let user = blocking(&state, move |accounts| {
        accounts.update_password(&email, &reset_token, &new_password)
    })
    .await?;

    Ok(Json(AccountMessage {
        email: user.email,
        message: "Password updated".to_string(),
    }))
}

/// GET /users/me
pub async fn me(current: Option<Extension<CurrentUser>>) -> Result<Json<UserView>, ApiError> {
    match current {
        Some(Extension(current)) => Ok(Json(current.user().view())),
        None => Err(ApiError::NotFound),
    }
}
