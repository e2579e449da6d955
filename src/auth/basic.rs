//! HTTP Basic Authentication

use super::strategy::AuthStrategy;
use super::types::{AuthError, AuthRequest, AuthType};
use crate::credentials::{CredentialCodec, Credentials};
use crate::users::{User, UserQuery, UserRepository};
use std::sync::Arc;
use tracing::debug;

/// Authenticates every request from its `Authorization: Basic` header
pub struct BasicAuth {
    users: Arc<dyn UserRepository>,
}

impl BasicAuth {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// First user with this email whose password verifies
    pub fn user_from_credentials(&self, credentials: &Credentials) -> Result<Option<User>, AuthError> {
        let candidates = self.users.find_by(&UserQuery::email(credentials.identifier.as_str()))?;
        Ok(candidates
            .into_iter()
            .find(|user| user.is_valid_password(&credentials.secret)))
    }
}

impl AuthStrategy for BasicAuth {
    fn auth_type(&self) -> AuthType {
        AuthType::Basic
    }

    fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError> {
        let credentials = match CredentialCodec::parse_header(self.extract_header_token(request)) {
            Ok(credentials) => credentials,
            Err(reason) => {
                debug!("Basic credentials rejected: {}", reason);
                return Ok(None);
            }
        };

        let user = self.user_from_credentials(&credentials)?;
        if user.is_none() {
            debug!("No user matched the offered Basic credentials");
        }
        Ok(user)
    }
}
