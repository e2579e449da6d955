//! Authentication Strategies
//!
//! One [`AuthStrategy`] interface with independent variants. Session-based
//! variants additionally implement [`SessionAuthority`] so credential
//! management can open and close sessions without knowing which variant runs.

use super::basic::BasicAuth;
use super::exclusion::ExclusionPolicy;
use super::session::{SessionAuth, SessionDbAuth, SessionExpAuth};
use super::types::{AuthError, AuthRequest, AuthType, AUTHORIZATION_HEADER};
use crate::config::AuthConfig;
use crate::session::{JsonFilePersistence, SessionPersistence};
use crate::users::{User, UserRepository};
use anyhow::{anyhow, Context};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::info;

/// Per-request identity decision
pub trait AuthStrategy: Send + Sync {
    fn auth_type(&self) -> AuthType;

    /// Whether `path` needs authentication under `excluded`
    fn requires_auth(&self, path: Option<&str>, excluded: &ExclusionPolicy) -> bool {
        excluded.requires_auth(path)
    }

    /// Raw `Authorization` header value, whatever its scheme
    fn extract_header_token<'r>(&self, request: &'r AuthRequest) -> Option<&'r str> {
        request.header(AUTHORIZATION_HEADER)
    }

    /// Session cookie value, for strategies that use one
    fn session_cookie<'r>(&self, _request: &'r AuthRequest) -> Option<&'r str> {
        None
    }

    /// The user behind this request, or `None` if it is not authenticated
    fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError>;

    /// Session management, for session-based strategies
    fn sessions(&self) -> Option<&dyn SessionAuthority> {
        None
    }
}

/// Session lifecycle operations exposed by session-based strategies
pub trait SessionAuthority: Send + Sync {
    fn cookie_name(&self) -> &str;

    /// TTL attached to new sessions; zero means they never expire
    fn session_ttl(&self) -> Duration;

    fn create_session_at(&self, user_id: &str, now: SystemTime) -> Result<Option<String>, AuthError>;

    /// Open a session for `user_id`; `None` when the id is empty
    fn create_session(&self, user_id: &str) -> Result<Option<String>, AuthError> {
        self.create_session_at(user_id, SystemTime::now())
    }

    fn user_id_for_session_id(
        &self,
        session_id: &str,
        now: SystemTime,
    ) -> Result<Option<String>, AuthError>;

    /// Destroy the session named by the request's cookie; `false` if there was none
    fn destroy_session(&self, request: &AuthRequest) -> Result<bool, AuthError>;

    fn purge_expired(&self, now: SystemTime) -> Result<usize, AuthError>;
}

/// Authentication disabled: nobody is identified and nothing is rejected
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuth;

impl AuthStrategy for NoAuth {
    fn auth_type(&self) -> AuthType {
        AuthType::None
    }

    fn requires_auth(&self, _path: Option<&str>, _excluded: &ExclusionPolicy) -> bool {
        false
    }

    fn resolve_identity(&self, _request: &AuthRequest) -> Result<Option<User>, AuthError> {
        Ok(None)
    }
}

/// Build the configured strategy, opening session persistence from config if needed
pub fn build_strategy(
    config: &AuthConfig,
    users: Arc<dyn UserRepository>,
) -> crate::Result<Arc<dyn AuthStrategy>> {
    let persistence = match (config.auth_type, &config.session_store_path) {
        (AuthType::SessionWithDb, Some(path)) => {
            Some(Arc::new(JsonFilePersistence::new(path.clone())) as Arc<dyn SessionPersistence>)
        }
        _ => None,
    };
    build_strategy_with(config, users, persistence)
}

/// Build the configured strategy with an explicit session persistence collaborator
pub fn build_strategy_with(
    config: &AuthConfig,
    users: Arc<dyn UserRepository>,
    persistence: Option<Arc<dyn SessionPersistence>>,
) -> crate::Result<Arc<dyn AuthStrategy>> {
    let cookie_name = || {
        config
            .session_cookie_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("session_cookie_name is required for auth type {}", config.auth_type))
    };

    let strategy: Arc<dyn AuthStrategy> = match config.auth_type {
        AuthType::None => Arc::new(NoAuth),
        AuthType::Basic => Arc::new(BasicAuth::new(users)),
        AuthType::Session => Arc::new(SessionAuth::new(users, cookie_name()?)),
        AuthType::SessionWithExpiry => Arc::new(SessionExpAuth::new(
            users,
            cookie_name()?,
            config.session_duration,
        )),
        AuthType::SessionWithDb => {
            let persistence = persistence
                .context("session_store_path is required for auth type session_with_db")?;
            Arc::new(SessionDbAuth::new(
                users,
                cookie_name()?,
                config.session_duration,
                persistence,
            ))
        }
    };

    info!(
        "Authentication strategy: {} (session ttl: {})",
        strategy.auth_type(),
        strategy
            .sessions()
            .map(|s| humantime::format_duration(s.session_ttl()).to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryPersistence;
    use crate::users::UserStore;

    fn auth_config(auth_type: AuthType) -> AuthConfig {
        AuthConfig {
            auth_type,
            session_cookie_name: Some("_my_session_id".to_string()),
            session_duration: Duration::from_secs(30),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_no_auth_never_requires_auth() {
        let policy = ExclusionPolicy::default();
        assert!(!NoAuth.requires_auth(Some("/api/v1/users/me"), &policy));
        assert!(NoAuth
            .resolve_identity(&AuthRequest::new("/api/v1/users/me"))
            .unwrap()
            .is_none());
        assert!(NoAuth.sessions().is_none());
    }

    #[test]
    fn test_build_each_strategy() {
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new());
        let persistence: Arc<dyn SessionPersistence> = Arc::new(MemoryPersistence::new());

        for auth_type in [
            AuthType::None,
            AuthType::Basic,
            AuthType::Session,
            AuthType::SessionWithExpiry,
            AuthType::SessionWithDb,
        ] {
            let strategy = build_strategy_with(
                &auth_config(auth_type),
                users.clone(),
                Some(persistence.clone()),
            )
            .unwrap();
            assert_eq!(strategy.auth_type(), auth_type);
            assert_eq!(strategy.sessions().is_some(), auth_type.uses_sessions());
        }
    }

    #[test]
    fn test_session_ttl_per_variant() {
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new());
        let plain = build_strategy_with(&auth_config(AuthType::Session), users.clone(), None).unwrap();
        assert_eq!(plain.sessions().unwrap().session_ttl(), Duration::ZERO);

        let expiring =
            build_strategy_with(&auth_config(AuthType::SessionWithExpiry), users, None).unwrap();
        assert_eq!(
            expiring.sessions().unwrap().session_ttl(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_missing_cookie_name_is_error() {
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new());
        let mut config = auth_config(AuthType::Session);
        config.session_cookie_name = None;
        assert!(build_strategy_with(&config, users, None).is_err());
    }

    #[test]
    fn test_db_variant_requires_persistence() {
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new());
        let config = auth_config(AuthType::SessionWithDb);
        assert!(build_strategy_with(&config, users, None).is_err());
    }
}
