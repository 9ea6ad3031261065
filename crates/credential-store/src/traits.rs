//! Storage trait definitions.

use crate::StorageResult;

/// Trait for durable credential storage backends.
///
/// Operations are atomic per key but not transactional across keys; callers
/// must not assume multi-key consistency if a failure lands mid-sequence.
pub trait CredentialStorage: Send + Sync {
    /// Store a value durably.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns whether the key existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Store several values. Per-key atomic only.
    fn set_all(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several keys. Missing keys are not an error.
    fn remove_all(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
