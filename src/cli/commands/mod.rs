//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to GitHub are async. Handlers create a tokio runtime
//! and `block_on` the async part, so dispatch itself stays synchronous.

mod analyze;
mod auth;
mod completion;
mod config_cmd;
mod history;
mod push;
mod repo;
mod serve;

// Re-export command functions for testing and direct invocation
pub use analyze::analyze;
pub use auth::auth;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list};
pub use history::history;
pub use push::push;
pub use repo::{add as repo_add, list as repo_list};
pub use serve::serve;

use crate::cli::args::{Command, ConfigAction, RepoAction};
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Serve { listen } => serve(ctx, listen.as_deref()),
        Command::Push {
            source,
            target,
            push_type,
        } => push(ctx, &source, &target, push_type),
        Command::Analyze { url } => analyze(ctx, &url),
        Command::Repo { action } => match action {
            RepoAction::Add { url } => repo_add(ctx, &url),
            RepoAction::List => repo_list(ctx),
        },
        Command::History { limit } => history(ctx, limit),
        Command::Auth {
            token,
            status,
            logout,
        } => auth(ctx, token.as_deref(), status, logout),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_get(ctx, &key),
            ConfigAction::List => config_list(ctx),
        },
        Command::Completion { shell } => completion(shell),
    }
}
