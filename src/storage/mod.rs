//! Storage Module
//!
//! Shared persistence plumbing for the durable session store and the user store.

pub mod json_file;

pub use json_file::JsonFile;

use thiserror::Error;

/// Infrastructure failure in a persistence collaborator.
///
/// Never used for "record not found"; absence is an `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("stored data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
