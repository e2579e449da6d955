//! Authentication Types

use crate::storage::StoreError;
use crate::users::User;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;
use thiserror::Error;

pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Which authentication strategy is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    #[serde(alias = "basic_auth")]
    Basic,
    #[serde(alias = "session_auth")]
    Session,
    #[serde(alias = "session_exp_auth")]
    SessionWithExpiry,
    #[serde(alias = "session_db_auth")]
    SessionWithDb,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::Basic => "basic",
            AuthType::Session => "session",
            AuthType::SessionWithExpiry => "session_with_expiry",
            AuthType::SessionWithDb => "session_with_db",
        }
    }

    /// Whether this strategy authenticates through a session cookie
    pub fn uses_sessions(&self) -> bool {
        matches!(
            self,
            AuthType::Session | AuthType::SessionWithExpiry | AuthType::SessionWithDb
        )
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(AuthType::None),
            "basic" | "basic_auth" => Ok(AuthType::Basic),
            "session" | "session_auth" => Ok(AuthType::Session),
            "session_with_expiry" | "session_exp_auth" => Ok(AuthType::SessionWithExpiry),
            "session_with_db" | "session_db_auth" => Ok(AuthType::SessionWithDb),
            other => Err(format!(
                "unknown auth type '{}' (expected none, basic, session, session_with_expiry or session_with_db)",
                other
            )),
        }
    }
}

/// Framework-independent view of one inbound request
#[derive(Debug, Clone)]
pub struct AuthRequest {
    path: String,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    received_at: SystemTime,
}

impl AuthRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            received_at: SystemTime::now(),
        }
    }

    /// Add a header; names are case-insensitive. A `Cookie` header is also parsed.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == "cookie" {
            for (k, v) in parse_cookie_header(&value) {
                self.cookies.entry(k).or_insert(v);
            }
        }
        self.headers.insert(name, value);
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Override the arrival time used for session expiry checks
    pub fn at(mut self, received_at: SystemTime) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }
}

/// Split a `Cookie` header into name/value pairs; the first occurrence of a name wins.
pub fn parse_cookie_header(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"');
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// The authenticated user attached to a request for downstream handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn user_id(&self) -> &str {
        &self.0.id
    }

    pub fn user(&self) -> &User {
        &self.0
    }
}

/// Why a request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No credentials offered (HTTP 401)
    MissingCredentials,
    /// Credentials offered but not accepted (HTTP 403)
    InvalidCredentials,
}

impl RejectReason {
    pub fn status_code(&self) -> u16 {
        match self {
            RejectReason::MissingCredentials => 401,
            RejectReason::InvalidCredentials => 403,
        }
    }
}

/// Per-request authentication outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerdict {
    Anonymous,
    Authenticated(CurrentUser),
    Rejected(RejectReason),
}

impl AuthVerdict {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthVerdict::Authenticated(current) => Some(current.user_id()),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AuthVerdict::Rejected(_))
    }
}

/// Infrastructure failure during authentication; never a bad credential
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session or user storage failure: {0}")]
    Storage(#[from] StoreError),
}
