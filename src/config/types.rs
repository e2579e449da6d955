//! Configuration Types

use crate::auth::AuthType;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SESSION_COOKIE: &str = "_my_session_id";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub users: UsersConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5000)),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub auth_type: AuthType,
    pub session_cookie_name: Option<String>,
    /// Session lifetime; zero means sessions never expire
    #[serde(with = "humantime_serde")]
    pub session_duration: Duration,
    /// How often expired in-process sessions are swept; zero disables the sweep
    #[serde(with = "humantime_serde")]
    pub purge_interval: Duration,
    pub excluded_paths: Vec<String>,
    pub session_store_path: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: AuthType::None,
            session_cookie_name: Some(DEFAULT_SESSION_COOKIE.to_string()),
            session_duration: Duration::ZERO,
            purge_interval: Duration::from_secs(60),
            excluded_paths: default_excluded_paths(),
            session_store_path: None,
        }
    }
}

fn default_excluded_paths() -> Vec<String> {
    [
        "/api/v1/status/",
        "/api/v1/unauthorized/",
        "/api/v1/forbidden/",
        "/api/v1/auth_session/login/",
        "/api/v1/auth_session/register/",
        "/api/v1/auth_session/reset_password/",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// User store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UsersConfig {
    /// JSON snapshot file; users are kept in memory only when absent
    pub store_path: Option<PathBuf>,
    pub seed: Vec<UserSeed>,
}

/// A user created at startup if its email is not registered yet
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserSeed {
    pub email: String,
    pub password: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub pii_fields: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            pii_fields: crate::logging::redact::PII_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}
