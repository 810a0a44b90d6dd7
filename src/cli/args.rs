//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging and show full audit trails
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output
//! - `--data-dir <path>`: Record store location

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::PushType;

/// repomirror - mirror the latest commit of one GitHub repository onto another
#[derive(Parser, Debug)]
#[command(name = "repomirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding tracked repositories and the operation log
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP endpoint
    #[command(
        name = "serve",
        long_about = "Serve the HTTP endpoint.\n\n\
            Accepts push requests as JSON on POST / and POST /git-operations, \
            plus analysis, registration, and history routes. Stops cleanly on \
            SIGINT or SIGTERM.",
        after_help = "\
EXAMPLES:
    # Listen on the configured address (default 127.0.0.1:8787)
    repomirror serve

    # Listen on all interfaces
    repomirror serve --listen 0.0.0.0:8787

    # Trigger a push
    curl -X POST localhost:8787/ -d '{\"type\":\"push\",\"sourceRepoId\":\"...\",\"targetRepoId\":\"...\"}'"
    )]
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Push the latest source commit onto the target's default branch
    #[command(
        name = "push",
        long_about = "Push the most recent commit of a tracked source repository onto \
            the default branch of a tracked target repository.\n\n\
            A regular push only fast-forwards. A force push moves the branch \
            unconditionally. A force-with-lease push moves it only if it still \
            points at the last commit recorded for the target.",
        after_help = "\
EXAMPLES:
    repomirror push <source-id> <target-id>
    repomirror push <source-id> <target-id> --type force
    repomirror push <source-id> <target-id> --type force-with-lease"
    )]
    Push {
        /// Source repository id
        source: String,

        /// Target repository id
        target: String,

        /// regular, force, or force-with-lease
        #[arg(long = "type", value_name = "TYPE", default_value = "regular")]
        push_type: PushType,
    },

    /// Show branches and recent commits of a GitHub repository
    #[command(name = "analyze")]
    Analyze {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
    },

    /// Manage tracked repositories
    #[command(name = "repo")]
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Show the operation log, newest first
    #[command(name = "history")]
    History {
        /// Maximum number of entries
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Store, check, or remove the GitHub token
    #[command(
        name = "auth",
        long_about = "Store, check, or remove the GitHub access token.\n\n\
            The token is kept in ~/.repomirror/secrets.toml with owner-only \
            permissions. GITHUB_ACCESS_TOKEN in the environment takes precedence \
            over the stored token.",
        after_help = "\
EXAMPLES:
    # Prompt for a token (input is hidden)
    repomirror auth

    # Non-interactive
    repomirror auth --token ghp_xxxx

    # Check which token would be used
    repomirror auth --status

    # Remove the stored token
    repomirror auth --logout"
    )]
    Auth {
        /// Token to store (prompted for when omitted)
        #[arg(long, conflicts_with_all = ["status", "logout"])]
        token: Option<String>,

        /// Show current authentication status
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove stored authentication
        #[arg(long)]
        logout: bool,
    },

    /// Show configuration values
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    repomirror completion bash >> ~/.bashrc
    repomirror completion zsh >> ~/.zshrc
    repomirror completion fish > ~/.config/fish/completions/repomirror.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Repository subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RepoAction {
    /// Analyze a URL and start tracking it
    Add {
        /// Repository URL
        url: String,
    },
    /// List tracked repositories
    List,
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn push_type_parses() {
        let cli = Cli::try_parse_from([
            "repomirror",
            "push",
            "src",
            "dst",
            "--type",
            "force-with-lease",
        ])
        .unwrap();
        match cli.command {
            Command::Push { push_type, .. } => assert_eq!(push_type, PushType::ForceWithLease),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn push_type_defaults_to_regular() {
        let cli = Cli::try_parse_from(["repomirror", "push", "src", "dst"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Push {
                push_type: PushType::Regular,
                ..
            }
        ));
    }

    #[test]
    fn unknown_push_type_rejected() {
        assert!(Cli::try_parse_from(["repomirror", "push", "a", "b", "--type", "yolo"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["repomirror", "history", "--json", "--data-dir", "/tmp/x"])
                .unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }
}
