//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$REPOMIRROR_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repomirror/config.toml`
//! 3. `~/.repomirror/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Values are validated after parsing: the listen address must parse as a
//! socket address, the API base must be an http(s) URL, and so on.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Upper bound for `commit_history_depth` (GitHub caps `per_page` at 100).
pub const MAX_COMMIT_HISTORY_DEPTH: u8 = 100;

/// User configuration.
///
/// # Example
///
/// ```toml
/// api_base = "https://api.github.com"
/// listen = "127.0.0.1:8787"
/// data_dir = "/var/lib/repomirror"
/// commit_history_depth = 5
/// default_branch = "main"
/// log_format = "json"
///
/// [secrets]
/// provider = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// GitHub REST API base URL
    pub api_base: Option<String>,

    /// Address the HTTP endpoint binds to
    pub listen: Option<String>,

    /// Directory holding the record store
    pub data_dir: Option<PathBuf>,

    /// Number of recent commits fetched per repository
    pub commit_history_depth: Option<u8>,

    /// Branch pushed to when a target has no recorded default branch
    pub default_branch: Option<String>,

    /// Log output format ("text" or "json")
    pub log_format: Option<String>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }

        if let Some(listen) = &self.listen {
            listen.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue(format!("invalid listen address '{}': {}", listen, e))
            })?;
        }

        if let Some(depth) = self.commit_history_depth {
            if depth == 0 || depth > MAX_COMMIT_HISTORY_DEPTH {
                return Err(ConfigError::InvalidValue(format!(
                    "commit_history_depth must be between 1 and {}, got {}",
                    MAX_COMMIT_HISTORY_DEPTH, depth
                )));
            }
        }

        if let Some(branch) = &self.default_branch {
            crate::core::types::RefName::for_branch(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid default_branch: {}", e))
            })?;
        }

        if let Some(format) = &self.log_format {
            LogFormat::parse(format)?;
        }

        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }

        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Valid format names.
    pub const VALID: &'static [&'static str] = &["text", "json"];

    /// Parse a format name.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid log_format '{}', must be one of: {}",
                other,
                Self::VALID.join(", ")
            ))),
        }
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
            api_base = "https://github.example.com/api/v3"
            listen = "0.0.0.0:9000"
            data_dir = "/tmp/repomirror"
            commit_history_depth = 10
            default_branch = "trunk"
            log_format = "json"

            [secrets]
            provider = "file"
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.commit_history_depth, Some(10));
        assert_eq!(config.default_branch.as_deref(), Some("trunk"));
    }

    #[test]
    fn empty_config_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("trunk = \"main\"");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        let cases = [
            FileConfig {
                api_base: Some("ftp://example.com".into()),
                ..Default::default()
            },
            FileConfig {
                listen: Some("not-an-address".into()),
                ..Default::default()
            },
            FileConfig {
                commit_history_depth: Some(0),
                ..Default::default()
            },
            FileConfig {
                commit_history_depth: Some(101),
                ..Default::default()
            },
            FileConfig {
                default_branch: Some("bad..name".into()),
                ..Default::default()
            },
            FileConfig {
                log_format: Some("yaml".into()),
                ..Default::default()
            },
            FileConfig {
                secrets: Some(SecretsConfig {
                    provider: Some("keychain".into()),
                }),
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?} should be invalid", config);
        }
    }
}
