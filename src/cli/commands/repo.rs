//! repo command - Register and list tracked repositories

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::records::{RecordStore, Repository};
use crate::engine::Analyzer;
use crate::ui::output;

/// Analyze a URL and start tracking it.
pub fn add(ctx: &Context, url: &str) -> Result<()> {
    let store = ctx.open_store()?;
    let host = ctx.github()?;
    let analyzer = Analyzer::new(&host, ctx.config.commit_history_depth());

    let rt = tokio::runtime::Runtime::new()?;
    let traced = match rt.block_on(analyzer.register(&store, url)) {
        Ok(traced) => traced,
        Err(failed) => {
            output::trail(&failed.trail, ctx.verbosity);
            return Err(failed.error).context("Failed to register repository");
        }
    };

    if ctx.json {
        return output::json(&traced.value);
    }
    output::trail(&traced.trail, ctx.verbosity);
    if ctx.quiet() {
        // The id alone, for scripts.
        println!("{}", traced.value.id);
    } else {
        println!("{}", format_row(&traced.value, ctx.config.default_branch()));
    }
    Ok(())
}

/// List tracked repositories.
pub fn list(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let repos = store
        .list_repositories()
        .context("Failed to read repositories")?;

    if ctx.json {
        return output::json(&repos);
    }
    if repos.is_empty() {
        output::print(
            "No repositories tracked. Add one with 'repomirror repo add <url>'.",
            ctx.verbosity,
        );
        return Ok(());
    }
    let fallback = ctx.config.default_branch();
    let rows: Vec<String> = repos.iter().map(|r| format_row(r, fallback)).collect();
    println!("{}", rows.join("\n"));
    Ok(())
}

/// One listing line. `fallback` is the configured branch a push would use
/// when the repository has no default branch recorded.
fn format_row(repo: &Repository, fallback: &str) -> String {
    let sha = repo
        .last_commit_sha
        .as_deref()
        .map(|s| s.get(..7).unwrap_or(s))
        .unwrap_or("-");
    format!(
        "{}  {:<30} {:<8} {:<10} {}",
        repo.id,
        repo.name,
        repo.status.to_string(),
        repo.target_branch_or(fallback),
        sha
    )
}
