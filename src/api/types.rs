//! API Types

use crate::accounts::AccountError;
use crate::auth::{AuthError, RejectReason};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub users: usize,
}

/// `{"email": .., "message": ..}` confirmation body
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountMessage {
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetTokenResponse {
    pub email: String,
    pub reset_token: String,
}

/// Form body for register and login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequestForm {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePasswordForm {
    pub email: Option<String>,
    pub reset_token: Option<String>,
    pub new_password: Option<String>,
}

/// Error responses of the HTTP surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    Forbidden,
    NotFound,
    MissingField(&'static str),
    AlreadyRegistered,
    UnknownEmail,
    WrongPassword,
    SessionsDisabled,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::WrongPassword => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound | ApiError::UnknownEmail => StatusCode::NOT_FOUND,
            ApiError::MissingField(_) | ApiError::AlreadyRegistered => StatusCode::BAD_REQUEST,
            ApiError::SessionsDisabled => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Unauthorized => serde_json::json!({ "error": "Unauthorized" }),
            ApiError::Forbidden => serde_json::json!({ "error": "Forbidden" }),
            ApiError::NotFound => serde_json::json!({ "error": "Not found" }),
            ApiError::MissingField(field) => {
                serde_json::json!({ "error": format!("{} missing", field) })
            }
            ApiError::AlreadyRegistered => {
                serde_json::json!({ "message": "email already registered" })
            }
            ApiError::UnknownEmail => serde_json::json!({ "error": "no user found for this email" }),
            ApiError::WrongPassword => serde_json::json!({ "error": "wrong password" }),
            ApiError::SessionsDisabled => {
                serde_json::json!({ "error": "sessions are not enabled" })
            }
            ApiError::Internal => serde_json::json!({ "error": "Internal server error" }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<RejectReason> for ApiError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::MissingCredentials => ApiError::Unauthorized,
            RejectReason::InvalidCredentials => ApiError::Forbidden,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        error!("Authentication failed on storage: {}", err);
        ApiError::Internal
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::AlreadyRegistered => ApiError::AlreadyRegistered,
            AccountError::UnknownEmail => ApiError::UnknownEmail,
            AccountError::WrongPassword => ApiError::WrongPassword,
            AccountError::InvalidResetToken => ApiError::Forbidden,
            AccountError::NoSession => ApiError::NotFound,
            AccountError::SessionsDisabled => ApiError::SessionsDisabled,
            AccountError::MissingField(field) => ApiError::MissingField(field),
            AccountError::Storage(_) | AccountError::Hashing(_) => {
                error!("Account operation failed: {}", err);
                ApiError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_mapping() {
        assert_eq!(
            ApiError::from(RejectReason::MissingCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(RejectReason::InvalidCredentials).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_account_error_mapping() {
        assert_eq!(ApiError::from(AccountError::NoSession), ApiError::NotFound);
        assert_eq!(
            ApiError::from(AccountError::InvalidResetToken).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AccountError::SessionsDisabled).status(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            ApiError::from(AccountError::Hashing("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(ApiError::Unauthorized.body()["error"], "Unauthorized");
        assert_eq!(ApiError::MissingField("email").body()["error"], "email missing");
        assert_eq!(
            ApiError::AlreadyRegistered.body()["message"],
            "email already registered"
        );
    }
}
