//! Account Service

use crate::auth::{AuthError, AuthRequest, AuthStrategy, SessionAuthority};
use crate::credentials::PasswordHasher;
use crate::logging::Redactor;
use crate::storage::StoreError;
use crate::users::{User, UserQuery, UserRepository, UserUpdate};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Account operation failures
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("email already registered")]
    AlreadyRegistered,
    #[error("no user with this email")]
    UnknownEmail,
    #[error("wrong password")]
    WrongPassword,
    #[error("invalid reset token")]
    InvalidResetToken,
    #[error("no active session")]
    NoSession,
    #[error("the active authentication strategy does not use sessions")]
    SessionsDisabled,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<AuthError> for AccountError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(store) => AccountError::Storage(store),
        }
    }
}

pub type AccountResult<T> = std::result::Result<T, AccountError>;

fn required<'a>(value: &'a str, field: &'static str) -> AccountResult<&'a str> {
    if value.is_empty() {
        return Err(AccountError::MissingField(field));
    }
    Ok(value)
}

/// Registration, login and password reset for stored users
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    strategy: Arc<dyn AuthStrategy>,
    redactor: Redactor,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, strategy: Arc<dyn AuthStrategy>) -> Self {
        Self {
            users,
            strategy,
            redactor: Redactor::pii(),
        }
    }

    /// Use `redactor` for identifiers written to account event logs
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    fn log_event(&self, event: &str, email: &str) {
        info!(
            "{}",
            self.redactor
                .redact(&format!("event={};email={};", event, email))
        );
    }

    fn sessions(&self) -> AccountResult<&dyn SessionAuthority> {
        self.strategy
            .sessions()
            .ok_or(AccountError::SessionsDisabled)
    }

    fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        Ok(self.users.find_by(&UserQuery::email(email))?.into_iter().next())
    }

    fn hash(password: &str) -> AccountResult<String> {
        PasswordHasher::hash(password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            AccountError::Hashing(e.to_string())
        })
    }

    /// Register a new user
    pub fn register(&self, email: &str, password: &str) -> AccountResult<User> {
        let email = required(email, "email")?;
        let password = required(password, "password")?;

        if self.find_by_email(email)?.is_some() {
            return Err(AccountError::AlreadyRegistered);
        }

        // The early lookup skips hashing for known emails; add_unique is the real check.
        let hashed = Self::hash(password)?;
        let user = self
            .users
            .add_unique(email, &hashed)?
            .ok_or(AccountError::AlreadyRegistered)?;
        self.log_event("register", email);
        Ok(user)
    }

    /// Register `email` unless it already exists; `None` when it did
    pub fn seed_user(&self, email: &str, password: &str) -> AccountResult<Option<User>> {
        match self.register(email, password) {
            Ok(user) => Ok(Some(user)),
            Err(AccountError::AlreadyRegistered) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether `email`/`password` identify a stored user
    pub fn valid_login(&self, email: &str, password: &str) -> AccountResult<bool> {
        Ok(self
            .find_by_email(email)?
            .is_some_and(|user| user.is_valid_password(password)))
    }

    /// Verify credentials and open a session; returns the user and the session id
    pub fn login(&self, email: &str, password: &str) -> AccountResult<(User, String)> {
        let email = required(email, "email")?;
        let password = required(password, "password")?;
        let sessions = self.sessions()?;

        let user = self.find_by_email(email)?.ok_or(AccountError::UnknownEmail)?;
        if !user.is_valid_password(password) {
            self.log_event("login_failed", email);
            return Err(AccountError::WrongPassword);
        }

        let session_id = sessions
            .create_session(&user.id)?
            .ok_or(AccountError::NoSession)?;
        let user = self
            .users
            .update(
                &user.id,
                UserUpdate {
                    session_id: Some(Some(session_id.clone())),
                    ..Default::default()
                },
            )?
            .unwrap_or(user);

        self.log_event("login", email);
        Ok((user, session_id))
    }

    /// Destroy the session named by the request's cookie
    pub fn logout(&self, request: &AuthRequest) -> AccountResult<()> {
        let sessions = self.sessions()?;
        let user_id = match request.cookie(sessions.cookie_name()) {
            Some(session_id) => {
                sessions.user_id_for_session_id(session_id, request.received_at())?
            }
            None => None,
        };

        if !sessions.destroy_session(request)? {
            return Err(AccountError::NoSession);
        }

        if let Some(user_id) = user_id {
            let cleared = self.users.update(
                &user_id,
                UserUpdate {
                    session_id: Some(None),
                    ..Default::default()
                },
            )?;
            if let Some(user) = cleared {
                self.log_event("logout", &user.email);
            }
        }
        Ok(())
    }

    /// Issue a fresh reset token for `email`, replacing any earlier one
    pub fn get_reset_password_token(&self, email: &str) -> AccountResult<String> {
        let email = required(email, "email")?;
        let user = self.find_by_email(email)?.ok_or(AccountError::UnknownEmail)?;

        let token = Uuid::new_v4().to_string();
        self.users.update(
            &user.id,
            UserUpdate {
                reset_token: Some(Some(token.clone())),
                ..Default::default()
            },
        )?;
        self.log_event("reset_token_issued", email);
        Ok(token)
    }

    /// Set a new password for `email` if it holds `reset_token`, consuming the token
    pub fn update_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> AccountResult<User> {
        let email = required(email, "email")?;
        if reset_token.is_empty() {
            return Err(AccountError::InvalidResetToken);
        }
        let new_password = required(new_password, "new_password")?;

        // The token only counts for the account it was issued to.
        let query = UserQuery {
            email: Some(email.to_string()),
            reset_token: Some(reset_token.to_string()),
            ..Default::default()
        };
        let user = self
            .users
            .find_by(&query)?
            .into_iter()
            .next()
            .ok_or(AccountError::InvalidResetToken)?;

        let updated = self
            .users
            .update(
                &user.id,
                UserUpdate {
                    hashed_password: Some(Self::hash(new_password)?),
                    reset_token: Some(None),
                    ..Default::default()
                },
            )?
            .ok_or(AccountError::InvalidResetToken)?;

        self.log_event("password_updated", &updated.email);
        Ok(updated)
    }
}
