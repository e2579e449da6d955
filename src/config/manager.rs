//! Configuration Manager

use super::Config;
use crate::auth::AuthType;
use crate::Result;
use anyhow::{bail, Context};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file, then layer environment overrides on top
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let mut config = if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            tracing::warn!("Configuration file not found at {}, using defaults", path.display());
            Config::default()
        };

        config.apply_env_overrides()?;
        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        tracing::info!("Configuration loaded and validated successfully");
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }
}

/// First variable among `names` that is set
fn lookup_any(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<(String, String)> {
    names
        .iter()
        .find_map(|name| lookup(name).map(|value| (name.to_string(), value)))
}

impl Config {
    /// Override settings from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Override settings from `lookup`, which maps variable names to values
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(auth_type) = lookup("AUTH_TYPE") {
            self.auth.auth_type = auth_type
                .parse::<AuthType>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid AUTH_TYPE: {}", auth_type))?;
        }

        if let Some((_, cookie)) = lookup_any(&lookup, &["SESSION_COOKIE_NAME", "SESSION_NAME"]) {
            self.auth.session_cookie_name = Some(cookie);
        }

        if let Some((name, seconds)) =
            lookup_any(&lookup, &["SESSION_DURATION_SECONDS", "SESSION_DURATION"])
        {
            let seconds = seconds
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid {}: {}", name, seconds))?;
            self.auth.session_duration = Duration::from_secs(seconds.max(0) as u64);
        }

        if let Some(path) = lookup("SESSION_STORE_PATH") {
            self.auth.session_store_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("USER_STORE_PATH") {
            self.users.store_path = Some(PathBuf::from(path));
        }

        if let Some(host) = lookup("API_HOST") {
            let ip = host
                .parse::<IpAddr>()
                .with_context(|| format!("Invalid API_HOST: {}", host))?;
            self.server.bind_addr.set_ip(ip);
        }

        if let Some(port) = lookup("API_PORT") {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("Invalid API_PORT: {}", port))?;
            self.server.bind_addr.set_port(port);
        }

        if let Some(level) = lookup("AUTHGATE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_auth_config()
            .with_context(|| "Authentication configuration validation failed")?;

        self.validate_users_config()
            .with_context(|| "User configuration validation failed")?;

        self.validate_logging_config()
            .with_context(|| "Logging configuration validation failed")?;

        Ok(())
    }

    fn validate_auth_config(&self) -> Result<()> {
        if self.auth.auth_type.uses_sessions() {
            let cookie = self.auth.session_cookie_name.as_deref().unwrap_or_default();
            if cookie.is_empty() {
                bail!("session_cookie_name is required for auth type {}", self.auth.auth_type);
            }
            if !is_cookie_token(cookie) {
                bail!("session_cookie_name '{}' is not a valid cookie name", cookie);
            }
        }

        if self.auth.auth_type == AuthType::SessionWithDb && self.auth.session_store_path.is_none() {
            bail!("session_store_path is required for auth type session_with_db");
        }

        for (i, path) in self.auth.excluded_paths.iter().enumerate() {
            if !path.starts_with('/') {
                bail!("Excluded path {} ('{}') must start with '/'", i, path);
            }
            let body = path.trim_end_matches('/');
            if body.trim_end_matches('*').contains('*') {
                bail!("Excluded path {} ('{}') may only use '*' as its last character", i, path);
            }
        }

        Ok(())
    }

    fn validate_users_config(&self) -> Result<()> {
        for (i, seed) in self.users.seed.iter().enumerate() {
            if seed.email.trim().is_empty() {
                bail!("Seed user {} has empty email", i);
            }
            if seed.password.is_empty() {
                bail!("Seed user {} has empty password", i);
            }
        }
        Ok(())
    }

    fn validate_logging_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!("logging.level must be one of: {}", valid_log_levels.join(", "));
        }
        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        bind: Option<&str>,
        port: Option<u16>,
        auth_type: Option<AuthType>,
        session_duration: Option<Duration>,
        log_level: Option<&str>,
    ) {
        if let Some(bind_str) = bind {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.server.bind_addr = addr;
                tracing::info!("CLI override: bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid bind address provided: {}", bind_str);
            }
        }

        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
            tracing::info!("CLI override: port set to {}", port);
        }

        if let Some(auth_type) = auth_type {
            self.auth.auth_type = auth_type;
            tracing::info!("CLI override: auth type set to {}", auth_type);
        }

        if let Some(duration) = session_duration {
            self.auth.session_duration = duration;
            tracing::info!(
                "CLI override: session duration set to {}",
                humantime::format_duration(duration)
            );
        }

        if let Some(level) = log_level {
            self.logging.level = level.to_string();
            tracing::info!("CLI override: log level set to {}", level);
        }
    }
}

/// RFC 6265 cookie-name token: visible ASCII without separators
fn is_cookie_token(name: &str) -> bool {
    const SEPARATORS: &str = "()<>@,;:\\\"/[]?={} \t";
    name.chars()
        .all(|c| c.is_ascii_graphic() && !SEPARATORS.contains(c))
}
