//! Durable credential storage for the bugdrill client.
//!
//! This crate provides:
//! - The [`CredentialStorage`] trait over simple key/value backends
//! - A [`FileStorage`] backend writing one file per key under an
//!   application-scoped directory, surviving process restarts
//! - A [`CredentialManager`] with typed accessors for the access token,
//!   refresh token, and cached user profile

mod file;
mod keys;
mod manager;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use manager::{CredentialManager, Credentials};
pub use traits::CredentialStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Key contains characters the backend cannot represent
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
