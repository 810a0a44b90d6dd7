//! cli::commands::auth
//!
//! Store, check, or remove the GitHub access token.
//!
//! The token is stored through the configured `SecretStore` and is never
//! printed. `--status` reports where the token would come from.
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token, input hidden)
//! repomirror auth
//!
//! # Non-interactive
//! repomirror auth --token ghp_xxxx
//!
//! # Check status
//! repomirror auth --status
//!
//! # Remove stored token
//! repomirror auth --logout
//! ```

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context as _, Result};
use serde_json::json;

use crate::cli::Context;
use crate::secrets::{self, SecretStore, GITHUB_TOKEN_KEY};
use crate::ui::output;

/// Run the auth command.
pub fn auth(ctx: &Context, token: Option<&str>, status: bool, logout: bool) -> Result<()> {
    let store = secrets::create_store(ctx.config.secrets_provider())
        .context("Failed to initialize secret store")?;

    if status {
        return show_status(ctx, store.as_ref());
    }
    if logout {
        store
            .delete(GITHUB_TOKEN_KEY)
            .context("Failed to remove stored token")?;
        output::print("Stored GitHub token removed.", ctx.verbosity);
        return Ok(());
    }

    let token_value = read_token(ctx, token)?;
    validate_token(&token_value)?;
    store
        .set(GITHUB_TOKEN_KEY, &token_value)
        .context("Failed to store token")?;

    output::print("GitHub token stored.", ctx.verbosity);
    Ok(())
}

fn show_status(ctx: &Context, store: &dyn SecretStore) -> Result<()> {
    let resolved = secrets::resolve_token(store).context("Failed to read GitHub token")?;
    let source = resolved.as_ref().map(|t| t.source.to_string());

    if ctx.json {
        return output::json(&json!({
            "authenticated": resolved.is_some(),
            "source": source,
        }));
    }
    if ctx.quiet() {
        // Machine-readable output
        println!(
            "{}",
            if resolved.is_some() {
                "authenticated"
            } else {
                "not_authenticated"
            }
        );
        return Ok(());
    }
    match source {
        Some(source) => println!("GitHub token configured ({}).", source),
        None => {
            println!("GitHub token not configured.");
            println!("Run 'repomirror auth' or set {}.", secrets::TOKEN_ENV_VAR);
        }
    }
    Ok(())
}

/// Token from the argument, or a hidden prompt on a terminal.
fn read_token(ctx: &Context, token_arg: Option<&str>) -> Result<String> {
    if let Some(t) = token_arg {
        return Ok(t.trim().to_string());
    }

    if ctx.quiet() || !io::stdin().is_terminal() {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    eprint!("GitHub access token: ");
    io::stderr().flush()?;
    let token = rpassword::read_password().context("Failed to read token")?;
    Ok(token.trim().to_string())
}

/// Basic format checks. The token is not checked against the API.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}
