//! server
//!
//! The HTTP endpoint: one axum router over a shared record store and Git
//! host. Requests run to completion independently; there is no background
//! work and no deduplication of concurrent pushes.

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

pub use handler::{create_router, AppError};

use crate::core::records::RecordStore;
use crate::engine::EngineOptions;
use crate::forge::GitHost;

/// Shared state for all handlers.
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub host: Arc<dyn GitHost>,
    pub options: EngineOptions,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        host: Arc<dyn GitHost>,
        options: EngineOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            host,
            options,
        })
    }
}

/// Bind `addr` and serve until SIGINT or SIGTERM.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let local = listener.local_addr().context("failed to read bound address")?;
    tracing::info!(%local, host = state.host.name(), "listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
