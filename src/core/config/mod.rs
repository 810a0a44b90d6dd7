//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`REPOMIRROR_DATA_DIR`, `REPOMIRROR_LISTEN`)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$REPOMIRROR_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repomirror/config.toml`
//! 3. `~/.repomirror/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use repomirror::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("API: {}", config.api_base());
//! println!("Listen: {}", config.listen());
//! println!("History depth: {}", config.commit_history_depth());
//! ```

pub mod schema;

pub use schema::{FileConfig, LogFormat, SecretsConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default GitHub REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default address for `repomirror serve`.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8787";

/// Default number of recent commits fetched per repository.
pub const DEFAULT_COMMIT_HISTORY_DEPTH: u8 = 5;

/// Branch pushed to when neither the target nor the config names one.
pub const DEFAULT_BRANCH: &str = "main";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Values taken from the environment at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub data_dir: Option<PathBuf>,
    pub listen: Option<String>,
}

impl EnvOverrides {
    /// Read `REPOMIRROR_DATA_DIR` and `REPOMIRROR_LISTEN`.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            data_dir: non_empty("REPOMIRROR_DATA_DIR").map(PathBuf::from),
            listen: non_empty("REPOMIRROR_LISTEN"),
        }
    }
}

/// Resolved configuration.
///
/// Accessor methods apply defaults and environment overrides.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file
    pub file: FileConfig,
    /// Values from the environment
    pub env: EnvOverrides,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// holds invalid values. A missing config file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let (file, path) = Self::load_file()?;
        Self::build(file, path, EnvOverrides::from_env())
    }

    /// Load configuration from an explicit file, without the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = Self::read_config(path)?;
        Self::build(file, Some(path.to_path_buf()), EnvOverrides::default())
    }

    /// Build a configuration from already-parsed parts.
    pub fn from_parts(file: FileConfig, env: EnvOverrides) -> Result<Self, ConfigError> {
        Self::build(file, None, env)
    }

    fn build(
        file: FileConfig,
        path: Option<PathBuf>,
        env: EnvOverrides,
    ) -> Result<Self, ConfigError> {
        file.validate()?;
        if let Some(listen) = &env.listen {
            listen.parse::<std::net::SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "invalid REPOMIRROR_LISTEN '{}': {}",
                    listen, e
                ))
            })?;
        }
        Ok(Self { file, env, path })
    }

    fn load_file() -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $REPOMIRROR_CONFIG
        if let Ok(path) = std::env::var("REPOMIRROR_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/repomirror/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("repomirror/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.repomirror/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".repomirror/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical config path (`~/.repomirror/config.toml`).
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".repomirror/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed.
    pub fn write_to(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// GitHub REST API base URL, without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.file
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Address for the HTTP endpoint.
    pub fn listen(&self) -> &str {
        self.env
            .listen
            .as_deref()
            .or(self.file.listen.as_deref())
            .unwrap_or(DEFAULT_LISTEN)
    }

    /// Directory holding the record store.
    ///
    /// Defaults to `~/.repomirror/data`.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = self.env.data_dir.as_ref().or(self.file.data_dir.as_ref()) {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".repomirror/data"))
    }

    /// Number of recent commits fetched per repository.
    pub fn commit_history_depth(&self) -> u8 {
        self.file
            .commit_history_depth
            .unwrap_or(DEFAULT_COMMIT_HISTORY_DEPTH)
    }

    /// Branch pushed to when the target has no recorded default branch.
    pub fn default_branch(&self) -> &str {
        self.file.default_branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Log output format.
    pub fn log_format(&self) -> LogFormat {
        self.file
            .log_format
            .as_deref()
            .and_then(|f| LogFormat::parse(f).ok())
            .unwrap_or_default()
    }

    /// Secrets provider. Defaults to "file".
    pub fn secrets_provider(&self) -> &str {
        self.file
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or("file")
    }

    /// Path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All effective values as `(key, value)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let data_dir = self
            .data_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|e| format!("<{}>", e));
        let log_format = match self.log_format() {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        };
        vec![
            ("api_base", self.api_base().to_string()),
            ("listen", self.listen().to_string()),
            ("data_dir", data_dir),
            (
                "commit_history_depth",
                self.commit_history_depth().to_string(),
            ),
            ("default_branch", self.default_branch().to_string()),
            ("log_format", log_format.to_string()),
            ("secrets.provider", self.secrets_provider().to_string()),
        ]
    }

    /// Look up one effective value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}
