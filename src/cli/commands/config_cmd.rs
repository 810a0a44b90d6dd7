//! config command - Show configuration values

use anyhow::{bail, Result};

use crate::cli::Context;
use crate::ui::output;

/// Print one effective configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    match ctx.config.get(key) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => bail!("Unknown configuration key: {}", key),
    }
}

/// Print all effective configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let entries = ctx.config.entries();

    if ctx.json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        return output::json(&map);
    }

    match ctx.config.loaded_from() {
        Some(path) => output::print(format!("# {}", path.display()), ctx.verbosity),
        None => output::print("# defaults (no config file found)", ctx.verbosity),
    }
    for (key, value) in entries {
        println!("{} = {}", key, value);
    }
    Ok(())
}
