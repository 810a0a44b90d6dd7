//! secrets
//!
//! Storage and resolution of the GitHub access token.
//!
//! # Resolution
//!
//! 1. `GITHUB_ACCESS_TOKEN` in the environment, if non-empty
//! 2. `github.token` in the configured secret store
//!
//! A token is never logged, printed, or included in error messages.
//!
//! # Example
//!
//! ```ignore
//! use repomirror::secrets::{create_store, resolve_token};
//!
//! let store = create_store("file")?;
//! match resolve_token(store.as_ref())? {
//!     Some(token) => println!("token from {}", token.source),
//!     None => println!("GitHub token not configured"),
//! }
//! ```

mod file_store;
mod traits;

use std::fmt;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Secret store key of the GitHub token.
pub const GITHUB_TOKEN_KEY: &str = "github.token";

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_ACCESS_TOKEN";

/// Create a secret store for a provider name.
///
/// # Errors
///
/// Unknown provider names, or initialization errors from the store.
pub fn create_store(provider: &str) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Box::new(FileSecretStore::new()?)),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file)",
            other
        ))),
    }
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Store,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Environment => write!(f, "{}", TOKEN_ENV_VAR),
            TokenSource::Store => write!(f, "secret store"),
        }
    }
}

/// A GitHub token and its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub value: String,
    pub source: TokenSource,
}

impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("value", &"[redacted]")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the GitHub token from the environment, then the store.
pub fn resolve_token(store: &dyn SecretStore) -> Result<Option<ResolvedToken>, SecretError> {
    resolve_token_with(std::env::var(TOKEN_ENV_VAR).ok(), store)
}

/// [`resolve_token`] with an explicit environment value.
pub fn resolve_token_with(
    env_value: Option<String>,
    store: &dyn SecretStore,
) -> Result<Option<ResolvedToken>, SecretError> {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Ok(Some(ResolvedToken {
            value: value.trim().to_string(),
            source: TokenSource::Environment,
        }));
    }
    Ok(store
        .get(GITHUB_TOKEN_KEY)?
        .filter(|v| !v.is_empty())
        .map(|value| ResolvedToken {
            value,
            source: TokenSource::Store,
        }))
}
