//! User Store

use super::types::{User, UserQuery, UserUpdate};
use crate::storage::{JsonFile, StoreResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// User-record collaborator.
///
/// Lookups return empty results for unknown users; `Err` is a storage fault.
pub trait UserRepository: Send + Sync {
    fn find_by(&self, query: &UserQuery) -> StoreResult<Vec<User>>;
    fn get(&self, id: &str) -> StoreResult<Option<User>>;
    fn add(&self, email: &str, hashed_password: &str) -> StoreResult<User>;
    /// Add a user unless one with `email` exists; the check and the insert are atomic.
    /// Returns `None` on conflict
    fn add_unique(&self, email: &str, hashed_password: &str) -> StoreResult<Option<User>>;
    /// Returns the updated record, or `None` if `id` is unknown
    fn update(&self, id: &str, update: UserUpdate) -> StoreResult<Option<User>>;
    fn count(&self) -> StoreResult<usize>;
}

/// In-memory user store with an optional JSON snapshot file
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
    file: Option<JsonFile<User>>,
    io_lock: Mutex<()>,
}

impl UserStore {
    /// Create an empty, purely in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading any existing users
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let file: JsonFile<User> = JsonFile::new(path);
        let users: HashMap<String, User> = file
            .load()?
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        info!("Loaded {} users from {}", users.len(), file.path().display());

        Ok(Self {
            users: RwLock::new(users),
            file: Some(file),
            io_lock: Mutex::new(()),
        })
    }

    /// Apply `f` to a copy of the map, persist the copy, then publish it.
    /// Nothing is written when `f` returns `None`.
    fn commit<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, User>) -> Option<R>,
    ) -> StoreResult<Option<R>> {
        let _io = self.io_lock.lock();
        let mut next = self.users.read().clone();
        let Some(result) = f(&mut next) else {
            return Ok(None);
        };

        if let Some(file) = &self.file {
            let mut records: Vec<User> = next.values().cloned().collect();
            records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            file.store(&records)?;
        }

        *self.users.write() = next;
        Ok(Some(result))
    }
}

impl UserRepository for UserStore {
    fn find_by(&self, query: &UserQuery) -> StoreResult<Vec<User>> {
        let mut found: Vec<User> = self
            .users
            .read()
            .values()
            .filter(|user| query.matches(user))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    fn get(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    fn add(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let user = User::new(email, hashed_password);
        let stored = user.clone();
        self.commit(move |users| {
            users.insert(stored.id.clone(), stored);
            Some(())
        })?;
        debug!("Added user {}", user.id);
        Ok(user)
    }

    fn add_unique(&self, email: &str, hashed_password: &str) -> StoreResult<Option<User>> {
        let user = User::new(email, hashed_password);
        let added = self.commit(|users| {
            if users.values().any(|existing| existing.email == email) {
                return None;
            }
            users.insert(user.id.clone(), user.clone());
            Some(user)
        })?;
        match &added {
            Some(user) => debug!("Added user {}", user.id),
            None => debug!("Refused duplicate user record"),
        }
        Ok(added)
    }

    fn update(&self, id: &str, update: UserUpdate) -> StoreResult<Option<User>> {
        self.commit(|users| {
            users.get_mut(id).map(|user| {
                update.apply(user);
                user.clone()
            })
        })
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.users.read().len())
    }
}
