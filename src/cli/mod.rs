//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Delegate to command handlers
//!
//! The CLI layer is thin. Push and analysis logic lives in
//! [`crate::engine`]; handlers only wire up the record store and the Git
//! host and format results.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::core::records::FileStore;
use crate::engine::EngineOptions;
use crate::forge::github::GitHubForge;
use crate::secrets;
use crate::ui::output::{self, Verbosity};

/// Execution context for commands.
///
/// Contains the resolved configuration and global settings derived from
/// CLI flags.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub verbosity: Verbosity,
    /// Print results as JSON
    pub json: bool,
}

impl Context {
    pub fn quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        self.config
            .data_dir()
            .context("Failed to resolve data directory")
    }

    /// Open the file-backed record store.
    pub fn open_store(&self) -> Result<FileStore> {
        let dir = self.data_dir()?;
        FileStore::open(&dir)
            .with_context(|| format!("Failed to open record store at {}", dir.display()))
    }

    /// GitHub client for the configured API base.
    ///
    /// Without a token the client is still returned; every call then fails
    /// with "GitHub token not configured".
    pub fn github(&self) -> Result<GitHubForge> {
        let store = secrets::create_store(self.config.secrets_provider())
            .context("Failed to initialize secret store")?;
        let token = match secrets::resolve_token(store.as_ref())
            .context("Failed to read GitHub token")?
        {
            Some(token) => {
                tracing::debug!(source = %token.source, "using GitHub token");
                token.value
            }
            None => {
                output::warn(
                    "GitHub token not configured. Run 'repomirror auth' or set GITHUB_ACCESS_TOKEN.",
                    self.verbosity,
                );
                String::new()
            }
        };
        Ok(GitHubForge::with_api_base(token, self.config.api_base()))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::from_config(&self.config)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir.clone() {
        config.env.data_dir = Some(dir);
    }

    let serving = matches!(cli.command, args::Command::Serve { .. });
    let level = crate::telemetry::default_level(cli.debug, serving);
    let format = if serving {
        config.log_format()
    } else {
        crate::core::config::LogFormat::Text
    };
    crate::telemetry::init(level, format)?;

    let ctx = Context {
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}
