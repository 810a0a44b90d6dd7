//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! Keys are namespaced (`github.token`). Implementations must never log,
//! print, or include secret values in error messages.

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages never include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secret: {0}")]
    ReadError(String),

    /// Failed to write to secret storage.
    #[error("failed to write secret: {0}")]
    WriteError(String),

    /// Provider not available or not configured.
    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Key-value storage for secrets.
pub trait SecretStore: Send + Sync {
    /// Get a secret by key, `None` if it is not stored.
    ///
    /// The returned value is the raw secret. Do not log or print it.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SecretError::ReadError("disk full".into());
        assert!(err.to_string().contains("read"));

        let err = SecretError::WriteError("permission denied".into());
        assert!(err.to_string().contains("write"));

        let err = SecretError::ProviderNotAvailable("vault".into());
        assert!(err.to_string().contains("provider"));
    }
}
