//! High-level API for managing stored credentials.

use crate::{CredentialStorage, StorageError, StorageKeys, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A complete credential pair.
///
/// The pair is only ever handed out whole: a store holding one token but not
/// the other reports no credentials at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Short-lived bearer token sent on every authenticated request.
    pub access_token: String,
    /// Long-lived token sent only to the refresh endpoint.
    pub refresh_token: String,
}

/// High-level API for storing and retrieving session credentials.
pub struct CredentialManager {
    storage: Box<dyn CredentialStorage>,
}

impl CredentialManager {
    /// Create a new credential manager with the given storage backend.
    pub fn new(storage: Box<dyn CredentialStorage>) -> Self {
        Self { storage }
    }

    // ==========================================
    // Tokens
    // ==========================================

    /// Store the access token.
    pub fn set_access_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::ACCESS_TOKEN, token)
    }

    /// Retrieve the access token.
    pub fn access_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::ACCESS_TOKEN)
    }

    /// Store the refresh token.
    pub fn set_refresh_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::REFRESH_TOKEN, token)
    }

    /// Retrieve the refresh token.
    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::REFRESH_TOKEN)
    }

    /// Retrieve the stored credential pair.
    ///
    /// Returns `None` unless both tokens are present; a partial pair (e.g. a
    /// write interrupted between keys) counts as no credentials.
    pub fn credentials(&self) -> StorageResult<Option<Credentials>> {
        let access = self.storage.get(StorageKeys::ACCESS_TOKEN)?;
        let refresh = self.storage.get(StorageKeys::REFRESH_TOKEN)?;
        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(Credentials {
                access_token,
                refresh_token,
            })),
            _ => Ok(None),
        }
    }

    /// Check whether a credential pair is stored.
    pub fn has_credentials(&self) -> StorageResult<bool> {
        Ok(self.credentials()?.is_some())
    }

    // ==========================================
    // Cached profile
    // ==========================================

    /// Store the last successfully fetched user profile.
    pub fn set_cached_profile<T: Serialize>(&self, profile: &T) -> StorageResult<()> {
        let json = serde_json::to_string(profile)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::CACHED_USER, &json)
    }

    /// Retrieve the cached user profile, if any.
    pub fn cached_profile<T: DeserializeOwned>(&self) -> StorageResult<Option<T>> {
        match self.storage.get(StorageKeys::CACHED_USER)? {
            Some(json) => {
                let profile = serde_json::from_str(&json)
                    .map_err(|e| StorageError::Encoding(e.to_string()))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    // ==========================================
    // Session lifecycle
    // ==========================================

    /// Store a complete session: both tokens plus the cached profile.
    pub fn set_session<T: Serialize>(
        &self,
        access_token: &str,
        refresh_token: &str,
        profile: &T,
    ) -> StorageResult<()> {
        self.set_access_token(access_token)?;
        self.set_refresh_token(refresh_token)?;
        self.set_cached_profile(profile)?;
        Ok(())
    }

    /// Clear all session keys.
    ///
    /// Best effort: a failure to delete one key does not stop the others.
    pub fn clear_session(&self) {
        for key in StorageKeys::SESSION_KEYS {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "failed to remove stored credential");
            }
        }
    }
}
