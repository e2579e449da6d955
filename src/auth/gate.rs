//! Authentication Gate
//!
//! Per-request entry point: combines the active [`AuthStrategy`] with the
//! [`ExclusionPolicy`] and turns the outcome into an [`AuthVerdict`].

use super::exclusion::ExclusionPolicy;
use super::strategy::AuthStrategy;
use super::types::{AuthError, AuthRequest, AuthVerdict, CurrentUser, RejectReason};
use std::sync::Arc;
use tracing::debug;

/// Authentication gate shared by every request handler
#[derive(Clone)]
pub struct AuthGate {
    strategy: Arc<dyn AuthStrategy>,
    excluded: ExclusionPolicy,
}

impl AuthGate {
    pub fn new(strategy: Arc<dyn AuthStrategy>, excluded: ExclusionPolicy) -> Self {
        Self { strategy, excluded }
    }

    pub fn strategy(&self) -> &Arc<dyn AuthStrategy> {
        &self.strategy
    }

    pub fn excluded(&self) -> &ExclusionPolicy {
        &self.excluded
    }

    /// Decide whether `request` may proceed and as whom.
    ///
    /// 1. Excluded paths (and every path under no-auth) are `Anonymous`.
    /// 2. Neither an `Authorization` header nor the session cookie: 401.
    /// 3. A resolvable identity: `Authenticated`.
    /// 4. Otherwise 403 when a header was offered, 401 when only a cookie
    ///    was and it no longer names a live session.
    ///
    /// `Err` is reserved for storage failures.
    pub fn authenticate(&self, request: &AuthRequest) -> Result<AuthVerdict, AuthError> {
        let path = request.path();
        if !self.strategy.requires_auth(Some(path), &self.excluded) {
            return Ok(AuthVerdict::Anonymous);
        }

        let header = self.strategy.extract_header_token(request);
        let cookie = self.strategy.session_cookie(request);
        if header.is_none() && cookie.is_none() {
            debug!("No credentials on {}", path);
            return Ok(AuthVerdict::Rejected(RejectReason::MissingCredentials));
        }

        match self.strategy.resolve_identity(request)? {
            Some(user) => {
                debug!("Request to {} authenticated as {}", path, user.id);
                Ok(AuthVerdict::Authenticated(CurrentUser(user)))
            }
            None if header.is_some() => {
                debug!("Credentials for {} not accepted", path);
                Ok(AuthVerdict::Rejected(RejectReason::InvalidCredentials))
            }
            None => {
                debug!("Session cookie on {} no longer valid", path);
                Ok(AuthVerdict::Rejected(RejectReason::MissingCredentials))
            }
        }
    }
}
