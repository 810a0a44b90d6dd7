//! serve command - Run the HTTP endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::server::{self, AppState};

/// Serve until SIGINT or SIGTERM.
pub fn serve(ctx: &Context, listen: Option<&str>) -> Result<()> {
    let listen = listen.unwrap_or(ctx.config.listen());
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", listen))?;

    let store = Arc::new(ctx.open_store()?);
    let host = Arc::new(ctx.github()?);
    let state = AppState::new(store, host, ctx.engine_options());

    tracing::info!(
        data_dir = %ctx.data_dir()?.display(),
        api_base = ctx.config.api_base(),
        "starting repomirror"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(state, addr))
}
