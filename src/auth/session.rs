//! Session Cookie Authentication
//!
//! Three variants over one shared core:
//! - [`SessionAuth`]: in-process sessions that never expire
//! - [`SessionExpAuth`]: in-process sessions with a configured TTL
//! - [`SessionDbAuth`]: TTL sessions mirrored to a persistence collaborator
//!
//! The core composes a [`SessionStore`] and the TTL handed to it on creation;
//! the variants differ only in which store and TTL they are built with.

use super::strategy::{AuthStrategy, SessionAuthority};
use super::types::{AuthError, AuthRequest, AuthType};
use crate::session::{DurableSessionStore, SessionPersistence, SessionStore, VolatileSessionStore};
use crate::users::{User, UserRepository};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// Shared session-cookie logic
pub struct SessionCore {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserRepository>,
    cookie_name: String,
    ttl: Duration,
}

impl SessionCore {
    pub fn new(
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserRepository>,
        cookie_name: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            users,
            cookie_name: cookie_name.into(),
            ttl,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn session_cookie<'r>(&self, request: &'r AuthRequest) -> Option<&'r str> {
        request.cookie(&self.cookie_name).filter(|v| !v.is_empty())
    }

    fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError> {
        let Some(session_id) = self.session_cookie(request) else {
            return Ok(None);
        };
        let Some(user_id) = self.store.resolve(session_id, request.received_at())? else {
            debug!("Session cookie did not resolve to a live session");
            return Ok(None);
        };

        let user = self.users.get(&user_id)?;
        if user.is_none() {
            debug!("Session {} points at unknown user {}", session_id, user_id);
        }
        Ok(user)
    }

    fn create_session_at(&self, user_id: &str, now: SystemTime) -> Result<Option<String>, AuthError> {
        let session_id = self.store.create(user_id, self.ttl, now)?;
        if session_id.is_some() {
            info!("Session opened for user {}", user_id);
        }
        Ok(session_id)
    }

    fn user_id_for_session_id(
        &self,
        session_id: &str,
        now: SystemTime,
    ) -> Result<Option<String>, AuthError> {
        if session_id.is_empty() {
            return Ok(None);
        }
        Ok(self.store.resolve(session_id, now)?)
    }

    fn destroy_session(&self, request: &AuthRequest) -> Result<bool, AuthError> {
        let Some(session_id) = self.session_cookie(request) else {
            return Ok(false);
        };
        let destroyed = self.store.destroy(session_id)?;
        if destroyed {
            info!("Session closed");
        }
        Ok(destroyed)
    }

    fn purge_expired(&self, now: SystemTime) -> Result<usize, AuthError> {
        Ok(self.store.purge_expired(now)?)
    }
}

macro_rules! session_strategy {
    ($variant:ident, $auth_type:expr) => {
        impl AuthStrategy for $variant {
            fn auth_type(&self) -> AuthType {
                $auth_type
            }

            fn session_cookie<'r>(&self, request: &'r AuthRequest) -> Option<&'r str> {
                self.core.session_cookie(request)
            }

            fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError> {
                self.core.resolve_identity(request)
            }

            fn sessions(&self) -> Option<&dyn SessionAuthority> {
                Some(self)
            }
        }

        impl SessionAuthority for $variant {
            fn cookie_name(&self) -> &str {
                &self.core.cookie_name
            }

            fn session_ttl(&self) -> Duration {
                self.core.ttl
            }

            fn create_session_at(
                &self,
                user_id: &str,
                now: SystemTime,
            ) -> Result<Option<String>, AuthError> {
                self.core.create_session_at(user_id, now)
            }

            fn user_id_for_session_id(
                &self,
                session_id: &str,
                now: SystemTime,
            ) -> Result<Option<String>, AuthError> {
                self.core.user_id_for_session_id(session_id, now)
            }

            fn destroy_session(&self, request: &AuthRequest) -> Result<bool, AuthError> {
                self.core.destroy_session(request)
            }

            fn purge_expired(&self, now: SystemTime) -> Result<usize, AuthError> {
                self.core.purge_expired(now)
            }
        }
    };
}

/// In-process sessions without expiry
pub struct SessionAuth {
    core: SessionCore,
}

impl SessionAuth {
    pub fn new(users: Arc<dyn UserRepository>, cookie_name: impl Into<String>) -> Self {
        Self {
            core: SessionCore::new(
                Arc::new(VolatileSessionStore::new()),
                users,
                cookie_name,
                Duration::ZERO,
            ),
        }
    }
}

session_strategy!(SessionAuth, AuthType::Session);

/// In-process sessions that expire `ttl` after creation (zero: never)
pub struct SessionExpAuth {
    core: SessionCore,
}

impl SessionExpAuth {
    pub fn new(users: Arc<dyn UserRepository>, cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            core: SessionCore::new(Arc::new(VolatileSessionStore::new()), users, cookie_name, ttl),
        }
    }
}

session_strategy!(SessionExpAuth, AuthType::SessionWithExpiry);

/// Expiring sessions that survive restarts through a persistence collaborator
pub struct SessionDbAuth {
    core: SessionCore,
}

impl SessionDbAuth {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cookie_name: impl Into<String>,
        ttl: Duration,
        persistence: Arc<dyn SessionPersistence>,
    ) -> Self {
        Self {
            core: SessionCore::new(
                Arc::new(DurableSessionStore::new(persistence)),
                users,
                cookie_name,
                ttl,
            ),
        }
    }
}

session_strategy!(SessionDbAuth, AuthType::SessionWithDb);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryPersistence, SessionQuery};
    use crate::users::UserStore;

    const COOKIE: &str = "_my_session_id";

    fn t(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(3_000_000 + secs)
    }

    fn users_with_one() -> (Arc<UserStore>, User) {
        let store = Arc::new(UserStore::new());
        let user = store.add("u@example.com", "unused").unwrap();
        (store, user)
    }

    fn request(session_id: &str, at: SystemTime) -> AuthRequest {
        AuthRequest::new("/api/v1/users/me")
            .with_cookie(COOKIE, session_id)
            .at(at)
    }

    #[test]
    fn test_session_auth_roundtrip() {
        let (users, user) = users_with_one();
        let auth = SessionAuth::new(users, COOKIE);

        let sid = auth.create_session_at(&user.id, t(0)).unwrap().unwrap();
        let resolved = auth.resolve_identity(&request(&sid, t(1_000_000))).unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id.clone()));

        assert!(auth.destroy_session(&request(&sid, t(1))).unwrap());
        assert!(auth.resolve_identity(&request(&sid, t(1))).unwrap().is_none());
        assert!(!auth.destroy_session(&request(&sid, t(1))).unwrap());
    }

    #[test]
    fn test_create_session_rejects_empty_user() {
        let (users, _) = users_with_one();
        let auth = SessionAuth::new(users, COOKIE);
        assert_eq!(auth.create_session("").unwrap(), None);
    }

    #[test]
    fn test_missing_or_foreign_cookie() {
        let (users, user) = users_with_one();
        let auth = SessionAuth::new(users, COOKIE);
        let sid = auth.create_session(&user.id).unwrap().unwrap();

        let other_cookie = AuthRequest::new("/").with_cookie("other", sid.as_str());
        assert!(auth.session_cookie(&other_cookie).is_none());
        assert!(auth.resolve_identity(&other_cookie).unwrap().is_none());
        assert!(!auth.destroy_session(&AuthRequest::new("/")).unwrap());
    }

    #[test]
    fn test_expiry_variant() {
        let (users, user) = users_with_one();
        let auth = SessionExpAuth::new(users, COOKIE, Duration::from_secs(10));
        let sid = auth.create_session_at(&user.id, t(0)).unwrap().unwrap();

        assert!(auth.resolve_identity(&request(&sid, t(10))).unwrap().is_some());
        assert!(auth.resolve_identity(&request(&sid, t(11))).unwrap().is_none());
        assert_eq!(auth.user_id_for_session_id(&sid, t(11)).unwrap(), None);
    }

    #[test]
    fn test_expiry_variant_zero_ttl() {
        let (users, user) = users_with_one();
        let auth = SessionExpAuth::new(users, COOKIE, Duration::ZERO);
        let sid = auth.create_session_at(&user.id, t(0)).unwrap().unwrap();
        assert!(auth
            .resolve_identity(&request(&sid, t(10_000_000)))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_session_for_deleted_user() {
        let users = Arc::new(UserStore::new());
        let auth = SessionAuth::new(users, COOKIE);
        let sid = auth.create_session("ghost").unwrap().unwrap();
        assert_eq!(
            auth.user_id_for_session_id(&sid, SystemTime::now()).unwrap().as_deref(),
            Some("ghost")
        );
        assert!(auth
            .resolve_identity(&request(&sid, SystemTime::now()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_db_variant_survives_restart() {
        let (users, user) = users_with_one();
        let persistence = Arc::new(MemoryPersistence::new());

        let before = SessionDbAuth::new(users.clone(), COOKIE, Duration::ZERO, persistence.clone());
        let sid = before.create_session_at(&user.id, t(0)).unwrap().unwrap();
        drop(before);

        let after = SessionDbAuth::new(users, COOKIE, Duration::ZERO, persistence.clone());
        let resolved = after.resolve_identity(&request(&sid, t(5))).unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));

        assert!(after.destroy_session(&request(&sid, t(6))).unwrap());
        assert!(persistence
            .search(&SessionQuery::by_session_id(sid.clone()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_volatile_variants_do_not_share_state() {
        let (users, user) = users_with_one();
        let first = SessionAuth::new(users.clone(), COOKIE);
        let second = SessionAuth::new(users, COOKIE);

        let sid = first.create_session(&user.id).unwrap().unwrap();
        assert!(second
            .resolve_identity(&request(&sid, SystemTime::now()))
            .unwrap()
            .is_none());
    }
}
