//! history command - Show the operation log

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::records::OperationLogEntry;
use crate::core::types::OperationStatus;
use crate::engine::Ledger;
use crate::ui::output;

/// Print the most recent operation log entries, newest first.
pub fn history(ctx: &Context, limit: Option<usize>) -> Result<()> {
    let store = ctx.open_store()?;
    let entries = Ledger::new(&store)
        .history(limit)
        .context("Failed to read operation log")?;

    if ctx.json {
        return output::json(&entries);
    }
    if entries.is_empty() {
        output::print("No operations recorded.", ctx.verbosity);
        return Ok(());
    }
    let rows: Vec<String> = entries.iter().map(format_entry).collect();
    println!("{}", rows.join("\n"));
    Ok(())
}

fn format_entry(entry: &OperationLogEntry) -> String {
    let detail = match entry.status {
        OperationStatus::Completed => entry.commit_hash.clone().unwrap_or_default(),
        OperationStatus::Failed => entry.error_message.clone().unwrap_or_default(),
        OperationStatus::Started => String::new(),
    };
    format!(
        "{}  {:<9} {:<16} {} -> {}  {}",
        entry.started_at,
        entry.status.to_string(),
        entry.push_type.as_str(),
        entry.source_repo_id,
        entry.target_repo_id,
        detail
    )
    .trim_end()
    .to_string()
}
