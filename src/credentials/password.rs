//! Password Hashing
//!
//! Argon2id digests in PHC string format with a fresh random salt per call.

use anyhow::anyhow;
use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};

use crate::Result;

/// One-way password hasher
pub struct PasswordHasher;

impl PasswordHasher {
    /// Hash a plaintext password with a new 128-bit salt.
    pub fn hash(plaintext: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!("salt generation failed: {}", e))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;

        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {}", e))?
            .to_string();
        Ok(digest)
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A malformed digest verifies as `false`.
    pub fn verify(plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let digest = PasswordHasher::hash("correct horse").unwrap();
        assert!(PasswordHasher::verify("correct horse", &digest));
        assert!(!PasswordHasher::verify("wrong horse", &digest));
    }

    #[test]
    fn test_salt_uniqueness() {
        let first = PasswordHasher::hash("same").unwrap();
        let second = PasswordHasher::hash("same").unwrap();
        assert_ne!(first, second);
        assert!(PasswordHasher::verify("same", &first));
        assert!(PasswordHasher::verify("same", &second));
    }

    #[test]
    fn test_malformed_digest() {
        assert!(!PasswordHasher::verify("anything", ""));
        assert!(!PasswordHasher::verify("anything", "not-a-phc-string"));
        assert!(!PasswordHasher::verify("anything", "$argon2id$v=19$garbage"));
    }
}
