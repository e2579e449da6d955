//! Accounts Module
//!
//! Credential management on top of the user store and the active strategy:
//! registration, login/logout and password reset.

pub mod service;

pub use service::{AccountError, AccountService};
