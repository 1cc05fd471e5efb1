//! revassignd: HTTP service for pull request reviewer assignment.
//!
//! Wires configuration, storage and the core services into an axum router
//! and serves it until Ctrl-C or SIGTERM.

pub mod config;
pub mod http;
pub mod state;

use anyhow::{Context, Result};
use revassign_core::METRICS;
use tracing::{info, warn};

pub use config::{Backend, Config};
pub use http::router;
pub use state::AppState;

/// Serve the API described by `config` until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<()> {
    let state = AppState::from_config(&config).await?;
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("revassignd listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    METRICS.flush();
    info!("revassignd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
