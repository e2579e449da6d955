//! Basic Authorization Header Codec

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

const BASIC_PREFIX: &str = "Basic ";

/// Why a Basic header could not be turned into credentials.
///
/// Both variants are routine: callers fold them into "not authenticated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credentials not present")]
    NotPresent,
    #[error("malformed base64 encoding")]
    MalformedEncoding,
}

/// Identifier/secret pair taken from one request; never persisted
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}

/// Decoder for `Authorization: Basic <base64>` headers
pub struct CredentialCodec;

impl CredentialCodec {
    /// Return the token after the exact `"Basic "` prefix.
    pub fn extract_token(header: Option<&str>) -> Result<&str, CredentialError> {
        match header {
            Some(value) if !value.is_empty() => value
                .strip_prefix(BASIC_PREFIX)
                .ok_or(CredentialError::NotPresent),
            _ => Err(CredentialError::NotPresent),
        }
    }

    /// Strictly decode a base64 token into UTF-8 text.
    pub fn decode(token: &str) -> Result<String, CredentialError> {
        let bytes = general_purpose::STANDARD
            .decode(token)
            .map_err(|_| CredentialError::MalformedEncoding)?;
        String::from_utf8(bytes).map_err(|_| CredentialError::MalformedEncoding)
    }

    /// Split decoded text at the first colon; the rest is the secret verbatim.
    pub fn split_credentials(decoded: &str) -> Result<Credentials, CredentialError> {
        let (identifier, secret) = decoded
            .split_once(':')
            .ok_or(CredentialError::NotPresent)?;

        Ok(Credentials {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        })
    }

    /// Run the full header → credentials pipeline.
    pub fn parse_header(header: Option<&str>) -> Result<Credentials, CredentialError> {
        let token = Self::extract_token(header)?;
        let decoded = Self::decode(token)?;
        Self::split_credentials(&decoded)
    }

    /// Build a header value for the given pair (used by clients and tests)
    pub fn encode_header(identifier: &str, secret: &str) -> String {
        let encoded = general_purpose::STANDARD.encode(format!("{}:{}", identifier, secret));
        format!("{}{}", BASIC_PREFIX, encoded)
    }
}
