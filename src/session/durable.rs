//! Durable Session Store
//!
//! In-process cache in front of a [`SessionPersistence`] collaborator.
//! `create` and `destroy` are mirrored to persistence; `resolve` consults the
//! cache first and falls back to persistence on a miss, caching what it finds.
//! This is what lets sessions survive a restart or be shared between
//! instances. The cache lock is never held across a persistence call; a
//! destroy generation counter keeps an in-flight fallback lookup from caching
//! a session that was destroyed while it was reading persistence.

use super::persistence::{SessionPersistence, SessionQuery};
use super::types::{Session, SessionStore};
use crate::storage::StoreResult;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct Cache {
    sessions: HashMap<String, Session>,
    // bumped by every destroy
    generation: u64,
}

pub struct DurableSessionStore {
    cache: RwLock<Cache>,
    persistence: Arc<dyn SessionPersistence>,
}

impl DurableSessionStore {
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            cache: RwLock::new(Cache::default()),
            persistence,
        }
    }

    fn load_from_persistence(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let generation = self.cache.read().generation;
        let found = self
            .persistence
            .search(&SessionQuery::by_session_id(session_id))?
            .into_iter()
            .next();

        let Some(session) = found else {
            return Ok(None);
        };

        let mut cache = self.cache.write();
        if cache.generation != generation {
            // A destroy ran while persistence was being read; the row may be gone.
            debug!("Skipping cache fill for a session lookup that raced a destroy");
            return Ok(Some(session));
        }
        debug!("Session loaded from persistence into cache");
        let cached = cache
            .sessions
            .entry(session.session_id.clone())
            .or_insert(session);
        Ok(Some(cached.clone()))
    }

    fn expire(&self, session: &Session) {
        self.cache.write().sessions.remove(&session.session_id);
        if let Err(e) = self.persistence.remove(session) {
            warn!("Failed to remove expired persisted session: {}", e);
        }
    }
}

impl SessionStore for DurableSessionStore {
    fn create(&self, user_id: &str, ttl: Duration, now: SystemTime) -> StoreResult<Option<String>> {
        if user_id.is_empty() {
            return Ok(None);
        }

        let mut session = Session::new(user_id, ttl, now);
        while self.cache.read().sessions.contains_key(&session.session_id) {
            session = Session::new(user_id, ttl, now);
        }

        // An id that did not reach persistence is never handed out.
        if let Err(e) = self.persistence.save(&session) {
            error!("Failed to persist new session for user {}: {}", user_id, e);
            return Err(e);
        }

        let session_id = session.session_id.clone();
        self.cache.write().sessions.insert(session_id.clone(), session);
        debug!("Created persisted session for user {}", user_id);
        Ok(Some(session_id))
    }

    fn resolve(&self, session_id: &str, now: SystemTime) -> StoreResult<Option<String>> {
        let cached = self.cache.read().sessions.get(session_id).cloned();
        let session = match cached {
            Some(session) => session,
            None => match self.load_from_persistence(session_id)? {
                Some(session) => session,
                None => return Ok(None),
            },
        };

        if session.is_expired(now) {
            self.expire(&session);
            return Ok(None);
        }
        Ok(Some(session.user_id))
    }

    fn destroy(&self, session_id: &str) -> StoreResult<bool> {
        let removed_locally = {
            let mut cache = self.cache.write();
            cache.generation = cache.generation.wrapping_add(1);
            cache.sessions.remove(session_id).is_some()
        };

        let rows = match self.persistence.search(&SessionQuery::by_session_id(session_id)) {
            Ok(rows) => rows,
            Err(e) if removed_locally => {
                warn!("Session removed from cache but persisted rows could not be listed: {}", e);
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        // Remove every persisted duplicate of this id.
        let mut removed_rows = 0usize;
        for row in &rows {
            match self.persistence.remove(row) {
                Ok(true) => removed_rows += 1,
                Ok(false) => {}
                Err(e) if removed_locally || removed_rows > 0 => {
                    warn!("Best-effort removal of a persisted session row failed: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        let destroyed = removed_locally || removed_rows > 0;
        if destroyed {
            info!("Destroyed session ({} persisted rows removed)", removed_rows);
        }
        Ok(destroyed)
    }

    fn purge_expired(&self, now: SystemTime) -> StoreResult<usize> {
        let mut purged: HashSet<String> = {
            let mut cache = self.cache.write();
            let ids: Vec<String> = cache
                .sessions
                .iter()
                .filter(|(_, s)| s.is_expired(now))
                .map(|(id, _)| id.clone())
                .collect();
            for id in &ids {
                cache.sessions.remove(id);
            }
            ids.into_iter().collect()
        };

        // Rows this instance never cached, such as ones left over from before a restart.
        let rows = match self.persistence.search(&SessionQuery::default()) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to list persisted sessions for purge: {}", e);
                return Ok(purged.len());
            }
        };
        for row in rows.iter().filter(|row| row.is_expired(now)) {
            match self.persistence.remove(row) {
                Ok(_) => {
                    purged.insert(row.session_id.clone());
                }
                Err(e) => warn!("Failed to remove expired persisted session: {}", e),
            }
        }

        if !purged.is_empty() {
            debug!("Purged {} expired sessions", purged.len());
        }
        Ok(purged.len())
    }

    fn active_count(&self) -> usize {
        self.cache.read().sessions.len()
    }
}
