//! Session Types

use crate::storage::StoreResult;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Server-side session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    #[serde(with = "humantime_serde")]
    pub created_at: SystemTime,
    /// Zero means the session never expires
    #[serde(with = "humantime_serde", default)]
    pub ttl: Duration,
}

impl Session {
    /// Create a session with a fresh random identifier
    pub fn new(user_id: impl Into<String>, ttl: Duration, now: SystemTime) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            created_at: now,
            ttl,
        }
    }

    /// Last instant at which the session still resolves
    pub fn expires_at(&self) -> Option<SystemTime> {
        if self.ttl.is_zero() {
            None
        } else {
            self.created_at.checked_add(self.ttl)
        }
    }

    /// Expired strictly after `created_at + ttl`; the boundary itself is still valid.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self.expires_at() {
            Some(deadline) => now > deadline,
            None => false,
        }
    }
}

/// Mapping from session id to session record.
///
/// Routine outcomes (empty user id, unknown or expired session, nothing to
/// destroy) are `Ok` values. `Err` is reserved for storage faults.
pub trait SessionStore: Send + Sync {
    /// Store a new session for `user_id` and return its id.
    ///
    /// Returns `Ok(None)` when `user_id` is empty.
    fn create(&self, user_id: &str, ttl: Duration, now: SystemTime) -> StoreResult<Option<String>>;

    /// Resolve a session id to its user id, or `None` if unknown or expired.
    fn resolve(&self, session_id: &str, now: SystemTime) -> StoreResult<Option<String>>;

    /// Remove a session. `Ok(false)` means there was nothing to destroy.
    fn destroy(&self, session_id: &str) -> StoreResult<bool>;

    /// Drop expired records, returning how many were removed.
    fn purge_expired(&self, now: SystemTime) -> StoreResult<usize>;

    /// Number of sessions held in process
    fn active_count(&self) -> usize;
}
