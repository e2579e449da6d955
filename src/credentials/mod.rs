//! Credentials Module
//!
//! Stateless helpers for decoding HTTP Basic credentials and hashing passwords.

pub mod codec;
pub mod password;

pub use codec::{CredentialCodec, CredentialError, Credentials};
pub use password::PasswordHasher;
