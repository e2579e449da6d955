//! AuthGate - Pluggable request authentication for HTTP APIs
//!
//! Serves the authentication API with the strategy selected in configuration.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use authgate::{
    api::{AppState, AuthServer},
    auth::AuthType,
    config::ConfigManager,
    logging::init_tracing,
    shutdown::ShutdownCoordinator,
};

/// CLI arguments for AuthGate
#[derive(Parser, Debug)]
#[command(name = "authgate")]
#[command(about = "AuthGate - Pluggable request authentication for HTTP APIs")]
#[command(version)]
#[command(long_about = "
AuthGate - Pluggable request authentication for HTTP APIs

Authenticates every request with one of: no authentication, HTTP Basic,
or server-side session cookies (optionally expiring, optionally persisted).

Configuration priority (highest to lowest):
1. Command-line arguments
2. Environment variables
3. Configuration file
4. Built-in defaults

Environment variables:
  AUTH_TYPE                  - none, basic, session, session_with_expiry, session_with_db
  SESSION_COOKIE_NAME        - Session cookie name (alias: SESSION_NAME)
  SESSION_DURATION_SECONDS   - Session lifetime in seconds, <= 0 never expires (alias: SESSION_DURATION)
  SESSION_STORE_PATH         - Session file for session_with_db
  USER_STORE_PATH            - User snapshot file
  API_HOST / API_PORT        - Bind address
  AUTHGATE_LOG_LEVEL         - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "authgate.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Bind address (overrides config file)
    #[arg(short, long, help = "Bind address (e.g., 0.0.0.0:5000)")]
    pub bind: Option<String>,

    /// Port to bind to (overrides config file)
    #[arg(short, long, help = "Port to bind to")]
    pub port: Option<u16>,

    /// Authentication strategy (overrides config file)
    #[arg(long, help = "Authentication strategy")]
    pub auth_type: Option<AuthType>,

    /// Session lifetime, e.g. 30m or 0s for no expiry
    #[arg(long, value_parser = humantime::parse_duration, help = "Session lifetime (e.g., 30m)")]
    pub session_duration: Option<Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // File (when present) and environment, then CLI overrides on top
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        ConfigManager::load_from_env()?
    };

    config.merge_with_cli_args(
        args.bind.as_deref(),
        args.port,
        args.auth_type,
        args.session_duration,
        args.log_level.as_deref(),
    );

    config
        .validate()
        .context("Final configuration validation failed")?;

    init_tracing(&config.logging.level, args.verbose)?;

    info!("Starting AuthGate v{}", env!("CARGO_PKG_VERSION"));
    if !args.config.exists() {
        info!(
            "Config file {} not found, using environment and defaults",
            args.config.display()
        );
    }

    info!("Configuration summary:");
    info!("  Bind address: {}", config.server.bind_addr);
    info!("  Authentication: {}", config.auth.auth_type);
    info!(
        "  Session duration: {}",
        humantime::format_duration(config.auth.session_duration)
    );
    info!("  Excluded paths: {}", config.auth.excluded_paths.join(", "));

    if args.validate_config {
        info!("Configuration is valid");
        return Ok(());
    }

    let app_state = AppState::from_config(&config)?;

    let shutdown_coordinator = ShutdownCoordinator::new(config.server.shutdown_timeout);
    let server = AuthServer::new(
        config.server.bind_addr,
        app_state,
        config.auth.purge_interval,
        shutdown_coordinator.clone(),
    );
    let mut server_handle = tokio::spawn(server.start());

    info!("AuthGate started; press Ctrl+C or send SIGTERM/SIGINT to shut down");

    tokio::select! {
        result = shutdown_coordinator.listen_for_signals() => {
            if let Err(e) = result {
                error!("Error setting up signal handlers: {}", e);
                shutdown_coordinator.trigger();
            }
        }
        result = &mut server_handle => {
            // Server exited on its own, usually a bind failure
            return match result {
                Ok(served) => served,
                Err(e) => Err(e.into()),
            };
        }
    }

    info!("Initiating graceful shutdown...");
    match tokio::time::timeout(shutdown_coordinator.timeout(), &mut server_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!("Server error during shutdown: {}", e),
        Ok(Err(e)) => error!("Server task failed: {}", e),
        Err(_) => {
            warn!(
                "Shutdown timeout of {} reached, aborting open connections",
                humantime::format_duration(shutdown_coordinator.timeout())
            );
            server_handle.abort();
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
