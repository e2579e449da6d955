//! Session Persistence Collaborators
//!
//! The durable session store mirrors every mutation through one of these.

use super::types::Session;
use crate::storage::{JsonFile, StoreResult};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Search criteria for persisted sessions; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl SessionQuery {
    pub fn by_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            user_id: None,
        }
    }

    pub fn by_user_id(user_id: impl Into<String>) -> Self {
        Self {
            session_id: None,
            user_id: Some(user_id.into()),
        }
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.session_id.as_ref().map_or(true, |id| *id == session.session_id)
            && self.user_id.as_ref().map_or(true, |id| *id == session.user_id)
    }
}

/// Durable storage for session records.
///
/// Implementations may keep duplicate rows for the same session id; `remove`
/// deletes rows equal to the given record.
pub trait SessionPersistence: Send + Sync {
    fn save(&self, session: &Session) -> StoreResult<()>;
    fn search(&self, query: &SessionQuery) -> StoreResult<Vec<Session>>;
    /// Returns `true` if at least one row was removed
    fn remove(&self, session: &Session) -> StoreResult<bool>;
}

/// Process-local persistence; share one instance between stores to model
/// several instances or a restart
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    rows: Mutex<Vec<Session>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl SessionPersistence for MemoryPersistence {
    fn save(&self, session: &Session) -> StoreResult<()> {
        self.rows.lock().push(session.clone());
        Ok(())
    }

    fn search(&self, query: &SessionQuery) -> StoreResult<Vec<Session>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect())
    }

    fn remove(&self, session: &Session) -> StoreResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|row| row != session);
        Ok(rows.len() < before)
    }
}

/// Sessions persisted as a JSON array in a single file
#[derive(Debug)]
pub struct JsonFilePersistence {
    file: JsonFile<Session>,
    // serialises read-modify-write cycles on the file within this process
    io_lock: Mutex<()>,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
            io_lock: Mutex::new(()),
        }
    }
}

impl SessionPersistence for JsonFilePersistence {
    fn save(&self, session: &Session) -> StoreResult<()> {
        let _guard = self.io_lock.lock();
        self.file.update(|rows| rows.push(session.clone()))
    }

    fn search(&self, query: &SessionQuery) -> StoreResult<Vec<Session>> {
        let _guard = self.io_lock.lock();
        let rows = self.file.load()?;
        Ok(rows.into_iter().filter(|row| query.matches(row)).collect())
    }

    fn remove(&self, session: &Session) -> StoreResult<bool> {
        let _guard = self.io_lock.lock();
        let mut rows = self.file.load()?;
        let before = rows.len();
        rows.retain(|row| row != session);
        if rows.len() == before {
            return Ok(false);
        }
        self.file.store(&rows)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_query_matching() {
        let session = Session::new("u1", Duration::ZERO, SystemTime::now());
        assert!(SessionQuery::default().matches(&session));
        assert!(SessionQuery::by_session_id(session.session_id.clone()).matches(&session));
        assert!(SessionQuery::by_user_id("u1").matches(&session));
        assert!(!SessionQuery::by_user_id("u2").matches(&session));
    }

    #[test]
    fn test_json_file_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let persistence = JsonFilePersistence::new(&path);

        let session = Session::new("u1", Duration::from_secs(60), SystemTime::now());
        persistence.save(&session).unwrap();
        persistence.save(&session).unwrap();

        let reopened = JsonFilePersistence::new(&path);
        let found = reopened
            .search(&SessionQuery::by_session_id(session.session_id.clone()))
            .unwrap();
        assert_eq!(found.len(), 2);

        // equal duplicates go in one call
        assert!(reopened.remove(&session).unwrap());
        assert!(!reopened.remove(&session).unwrap());
        assert!(persistence.search(&SessionQuery::default()).unwrap().is_empty());
    }
}
