//! User Types

use crate::credentials::PasswordHasher;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub hashed_password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub reset_token: Option<String>,
    #[serde(with = "humantime_serde")]
    pub created_at: SystemTime,
    #[serde(with = "humantime_serde")]
    pub updated_at: SystemTime,
}

impl User {
    /// Create a new user from an already hashed password
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            first_name: None,
            last_name: None,
            session_id: None,
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Verify a plaintext password against the stored hash
    pub fn is_valid_password(&self, plaintext: &str) -> bool {
        PasswordHasher::verify(plaintext, &self.hashed_password)
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (None, None) => self.email.clone(),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (Some(first), Some(last)) => format!("{} {}", first, last),
        }
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// Public JSON representation of a user; never carries secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(with = "humantime_serde")]
    pub created_at: SystemTime,
    #[serde(with = "humantime_serde")]
    pub updated_at: SystemTime,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Lookup criteria, AND-combined. A query with no criteria matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub email: Option<String>,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
}

impl UserQuery {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    pub fn reset_token(token: impl Into<String>) -> Self {
        Self {
            reset_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.session_id.is_none() && self.reset_token.is_none()
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.is_empty() {
            return false;
        }
        self.email.as_ref().map_or(true, |e| *e == user.email)
            && self
                .session_id
                .as_ref()
                .map_or(true, |s| user.session_id.as_ref() == Some(s))
            && self
                .reset_token
                .as_ref()
                .map_or(true, |t| user.reset_token.as_ref() == Some(t))
    }
}

/// Partial update applied by `UserRepository::update`.
///
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub hashed_password: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub session_id: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(hash) = self.hashed_password {
            user.hashed_password = hash;
        }
        if let Some(first) = self.first_name {
            user.first_name = first;
        }
        if let Some(last) = self.last_name {
            user.last_name = last;
        }
        if let Some(session_id) = self.session_id {
            user.session_id = session_id;
        }
        if let Some(token) = self.reset_token {
            user.reset_token = token;
        }
        user.updated_at = SystemTime::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut user = User::new("bob@example.com", "x");
        assert_eq!(user.display_name(), "bob@example.com");
        user.first_name = Some("Bob".to_string());
        assert_eq!(user.display_name(), "Bob");
        user.last_name = Some("Dylan".to_string());
        assert_eq!(user.display_name(), "Bob Dylan");
    }

    #[test]
    fn test_view_hides_secrets() {
        let mut user = User::new("bob@example.com", "$argon2id$secret-hash");
        user.reset_token = Some("tok".to_string());
        let json = serde_json::to_string(&user.view()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("tok"));
        assert!(json.contains("bob@example.com"));
    }

    #[test]
    fn test_query_matching() {
        let mut user = User::new("bob@example.com", "x");
        user.session_id = Some("s1".to_string());

        assert!(UserQuery::email("bob@example.com").matches(&user));
        assert!(UserQuery::session_id("s1").matches(&user));
        assert!(!UserQuery::reset_token("t1").matches(&user));
        assert!(!UserQuery::default().matches(&user));
    }

    #[test]
    fn test_update_clears_fields() {
        let mut user = User::new("bob@example.com", "x");
        user.reset_token = Some("t".to_string());
        UserUpdate {
            reset_token: Some(None),
            hashed_password: Some("y".to_string()),
            ..Default::default()
        }
        .apply(&mut user);
        assert_eq!(user.reset_token, None);
        assert_eq!(user.hashed_password, "y");
    }

    #[test]
    fn test_is_valid_password() {
        let hash = PasswordHasher::hash("pw").unwrap();
        let user = User::new("bob@example.com", hash);
        assert!(user.is_valid_password("pw"));
        assert!(!user.is_valid_password("nope"));
    }
}
