//! Authentication Module
//!
//! Pluggable request authentication: a strategy chosen once at startup, the
//! excluded-path policy, and the gate that applies both to every request.

pub mod basic;
pub mod exclusion;
pub mod gate;
pub mod session;
pub mod strategy;
pub mod types;

pub use basic::BasicAuth;
pub use exclusion::ExclusionPolicy;
pub use gate::AuthGate;
pub use session::{SessionAuth, SessionDbAuth, SessionExpAuth};
pub use strategy::{build_strategy, build_strategy_with, AuthStrategy, NoAuth, SessionAuthority};
pub use types::{
    AuthError, AuthRequest, AuthType, AuthVerdict, CurrentUser, RejectReason, AUTHORIZATION_HEADER,
};
