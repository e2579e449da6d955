//! In-Process Session Store
//!
//! Sessions live only as long as the process. One coarse lock guards the map;
//! readers share it, `create`/`destroy` take it exclusively.

use super::types::{Session, SessionStore};
use crate::storage::StoreResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Volatile session store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct VolatileSessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl VolatileSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session record, expired or not
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }
}

impl SessionStore for VolatileSessionStore {
    fn create(&self, user_id: &str, ttl: Duration, now: SystemTime) -> StoreResult<Option<String>> {
        if user_id.is_empty() {
            return Ok(None);
        }

        let mut sessions = self.sessions.write();
        let mut session = Session::new(user_id, ttl, now);
        while sessions.contains_key(&session.session_id) {
            session = Session::new(user_id, ttl, now);
        }
        let session_id = session.session_id.clone();
        sessions.insert(session_id.clone(), session);

        debug!("Created in-process session for user {}", user_id);
        Ok(Some(session_id))
    }

    fn resolve(&self, session_id: &str, now: SystemTime) -> StoreResult<Option<String>> {
        {
            let sessions = self.sessions.read();
            match sessions.get(session_id) {
                None => return Ok(None),
                Some(session) if !session.is_expired(now) => {
                    return Ok(Some(session.user_id.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a concurrent destroy may have won.
        let mut sessions = self.sessions.write();
        if sessions.get(session_id).is_some_and(|s| s.is_expired(now)) {
            sessions.remove(session_id);
            debug!("Dropped expired session on lookup");
        }
        Ok(None)
    }

    fn destroy(&self, session_id: &str) -> StoreResult<bool> {
        Ok(self.sessions.write().remove(session_id).is_some())
    }

    fn purge_expired(&self, now: SystemTime) -> StoreResult<usize> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok(before - sessions.len())
    }

    fn active_count(&self) -> usize {
        self.sessions.read().len()
    }
}
