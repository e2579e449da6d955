//! API Server

use super::{handlers::AppState, routes::AuthApi};
use crate::accounts::AccountService;
use crate::auth::{build_strategy, AuthGate, AuthStrategy, ExclusionPolicy};
use crate::config::Config;
use crate::logging::{redact::REDACTION, redact::SEPARATOR, Redactor};
use crate::shutdown::{wait_for_shutdown, ShutdownCoordinator};
use crate::users::{UserRepository, UserStore};
use crate::Result;
use anyhow::{anyhow, Context};
use axum::{extract::Request, ServiceExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

impl AppState {
    /// Wire user store, strategy, gate and account service from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let users: Arc<dyn UserRepository> = match &config.users.store_path {
            Some(path) => Arc::new(
                UserStore::open(path)
                    .with_context(|| format!("Failed to open user store: {}", path.display()))?,
            ),
            None => Arc::new(UserStore::new()),
        };

        let strategy = build_strategy(&config.auth, users.clone())?;
        let redactor = Redactor::new(&config.logging.pii_fields, REDACTION, SEPARATOR)
            .context("Invalid logging.pii_fields")?;
        let accounts = AccountService::new(users, strategy.clone()).with_redactor(redactor);

        for seed in &config.users.seed {
            if accounts
                .seed_user(&seed.email, &seed.password)
                .map_err(|e| anyhow!("Failed to seed user: {}", e))?
                .is_some()
            {
                debug!("Seeded configured user");
            }
        }

        let gate = AuthGate::new(strategy, ExclusionPolicy::new(&config.auth.excluded_paths));
        Ok(Self {
            gate: Arc::new(gate),
            accounts: Arc::new(accounts),
            start_time: SystemTime::now(),
        })
    }
}

/// HTTP API server
pub struct AuthServer {
    bind_addr: SocketAddr,
    app_state: AppState,
    purge_interval: Duration,
    shutdown: ShutdownCoordinator,
}

impl AuthServer {
    pub fn new(
        bind_addr: SocketAddr,
        app_state: AppState,
        purge_interval: Duration,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            bind_addr,
            app_state,
            purge_interval,
            shutdown,
        }
    }

    /// Serve until the shutdown coordinator fires
    pub async fn start(self) -> Result<()> {
        info!("Starting API server on {}", self.bind_addr);

        let sweep = spawn_session_sweep(
            self.app_state.gate.strategy().clone(),
            self.purge_interval,
            &self.shutdown,
        );

        let app = AuthApi::create_app(self.app_state);
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", self.bind_addr))?;

        info!("API server listening on {}", self.bind_addr);

        let served = axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service(app),
        )
        .with_graceful_shutdown(self.shutdown.signalled())
        .await;

        if let Some(sweep) = sweep {
            sweep.abort();
        }

        if let Err(e) = served {
            error!("API server error: {}", e);
            return Err(e.into());
        }

        info!("API server stopped");
        Ok(())
    }
}

/// Periodically drop expired sessions; `None` when there is nothing to sweep
pub fn spawn_session_sweep(
    strategy: Arc<dyn AuthStrategy>,
    interval: Duration,
    shutdown: &ShutdownCoordinator,
) -> Option<tokio::task::JoinHandle<()>> {
    let ttl = strategy.sessions()?.session_ttl();
    if ttl.is_zero() || interval.is_zero() {
        return None;
    }

    let shutdown_rx = shutdown.subscribe();
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let stopped = wait_for_shutdown(shutdown_rx);
        tokio::pin!(stopped);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let strategy = strategy.clone();
                    let purged = tokio::task::spawn_blocking(move || {
                        strategy
                            .sessions()
                            .map(|sessions| sessions.purge_expired(SystemTime::now()))
                    })
                    .await;
                    match purged {
                        Ok(Some(Ok(0))) | Ok(None) => {}
                        Ok(Some(Ok(n))) => debug!("Purged {} expired sessions", n),
                        Ok(Some(Err(e))) => warn!("Session sweep failed: {}", e),
                        Err(e) => warn!("Session sweep task failed: {}", e),
                    }
                }
                _ = &mut stopped => {
                    debug!("Session sweep stopping");
                    break;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthType;
    use crate::config::UserSeed;

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert_eq!(state.gate.strategy().auth_type(), AuthType::None);
        assert_eq!(state.accounts.users().count().unwrap(), 0);
    }

    #[test]
    fn test_state_seeds_users_once() {
        let mut config = Config::default();
        config.users.seed = vec![
            UserSeed {
                email: "admin@example.com".to_string(),
                password: "change-me".to_string(),
            },
            UserSeed {
                email: "admin@example.com".to_string(),
                password: "other".to_string(),
            },
        ];
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.accounts.users().count().unwrap(), 1);
        assert!(state
            .accounts
            .valid_login("admin@example.com", "change-me")
            .unwrap());
    }

    #[tokio::test]
    async fn test_sweep_only_for_expiring_sessions() {
        let shutdown = ShutdownCoordinator::new(Duration::from_secs(1));

        let state = AppState::from_config(&Config::default()).unwrap();
        assert!(spawn_session_sweep(
            state.gate.strategy().clone(),
            Duration::from_millis(10),
            &shutdown
        )
        .is_none());

        let mut config = Config::default();
        config.auth.auth_type = AuthType::SessionWithExpiry;
        config.auth.session_duration = Duration::from_secs(1);
        let state = AppState::from_config(&config).unwrap();
        let handle = spawn_session_sweep(
            state.gate.strategy().clone(),
            Duration::from_millis(10),
            &shutdown,
        )
        .unwrap();

        shutdown.trigger();
        assert!(tokio::time::timeout(Duration::from_secs(2), handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_server_shuts_down_on_signal() {
        let shutdown = ShutdownCoordinator::new(Duration::from_secs(1));
        let state = AppState::from_config(&Config::default()).unwrap();
        let server = AuthServer::new(
            "127.0.0.1:0".parse().unwrap(),
            state,
            Duration::from_secs(60),
            shutdown.clone(),
        );

        let running = tokio::spawn(server.start());
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(2), running).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
