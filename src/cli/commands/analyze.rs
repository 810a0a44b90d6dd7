//! analyze command - Show details of a GitHub repository

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::engine::{Analyzer, RepoDetails};
use crate::ui::output;

/// Fetch and print repository details.
pub fn analyze(ctx: &Context, url: &str) -> Result<()> {
    let host = ctx.github()?;
    let analyzer = Analyzer::new(&host, ctx.config.commit_history_depth());

    let rt = tokio::runtime::Runtime::new()?;
    let traced = match rt.block_on(analyzer.analyze(url)) {
        Ok(traced) => traced,
        Err(failed) => {
            output::trail(&failed.trail, ctx.verbosity);
            return Err(failed.error).context("Analysis failed");
        }
    };

    if ctx.json {
        return output::json(&traced.value);
    }
    output::trail(&traced.trail, ctx.verbosity);
    output::print(render(&traced.value), ctx.verbosity);
    Ok(())
}

fn render(details: &RepoDetails) -> String {
    let mut lines = vec![
        details.slug.to_string(),
        format!("default branch: {}", details.default_branch),
        "branches:".to_string(),
    ];
    for branch in &details.branches {
        let marker = if branch.protected { " (protected)" } else { "" };
        lines.push(format!("  {} {}{}", short(&branch.sha), branch.name, marker));
    }
    lines.push("recent commits:".to_string());
    for commit in &details.last_commits {
        let subject = commit.message.lines().next().unwrap_or_default();
        lines.push(format!("  {} {}", short(&commit.sha), subject));
    }
    lines.join("\n")
}

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
