//! telemetry
//!
//! Process logging setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen here.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::LogFormat;

/// Default level: `debug` with `--debug`, `info` for the server, `warn`
/// for one-shot commands.
pub fn default_level(debug: bool, serving: bool) -> Level {
    match (debug, serving) {
        (true, _) => Level::DEBUG,
        (false, true) => Level::INFO,
        (false, false) => Level::WARN,
    }
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},{}={}", Level::WARN, env!("CARGO_PKG_NAME"), level))
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(level: Level, format: LogFormat) -> anyhow::Result<()> {
    let filter = filter(level);
    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .json();
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Text => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }
    Ok(())
}
