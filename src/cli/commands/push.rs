//! cli::commands::push
//!
//! Push the latest commit of one tracked repository onto another.
//!
//! # Example
//!
//! ```bash
//! repomirror push 3f6c... 9a1b...
//! repomirror push 3f6c... 9a1b... --type force
//! ```

use anyhow::{Context as _, Result};
use serde_json::json;

use crate::cli::Context;
use crate::core::types::{PushType, RecordId, UtcTimestamp};
use crate::engine::{PushOrchestrator, PushRequest, RefOutcome};
use crate::ui::output;

/// Run the push command.
pub fn push(ctx: &Context, source: &str, target: &str, push_type: PushType) -> Result<()> {
    let request = PushRequest {
        source_repo_id: RecordId::new(source).context("Invalid source repository id")?,
        target_repo_id: RecordId::new(target).context("Invalid target repository id")?,
        push_type,
    };
    let store = ctx.open_store()?;
    let host = ctx.github()?;
    let orchestrator = PushOrchestrator::new(&store, &host, ctx.engine_options());

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(orchestrator.push(&request)) {
        Ok(traced) => {
            let outcome = traced.value;
            if ctx.json {
                return output::json(&json!({
                    "success": true,
                    "result": outcome,
                    "logs": traced.trail,
                    "timestamp": UtcTimestamp::now(),
                }));
            }
            output::trail(&traced.trail, ctx.verbosity);
            let action = match &outcome.ref_outcome {
                RefOutcome::Created => "created",
                RefOutcome::Updated { .. } => "updated",
                RefOutcome::Unchanged => "already at",
            };
            output::print(
                format!(
                    "{} {} {} {}",
                    outcome.target.name,
                    outcome.ref_name,
                    action,
                    outcome.commit_sha
                ),
                ctx.verbosity,
            );
            Ok(())
        }
        Err(failed) => {
            if ctx.json {
                output::json(&json!({
                    "success": false,
                    "error": failed.error.to_string(),
                    "logs": failed.trail,
                    "details": { "kind": failed.error.kind() },
                }))?;
            } else {
                output::trail(&failed.trail, ctx.verbosity);
            }
            Err(failed.error).context("Push failed")
        }
    }
}
