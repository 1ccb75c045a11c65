//! HTTP listener and shutdown

use anyhow::{Context, Result};
use axum::Router;
use leadcap_core::Config;

/// Serve the lead API until SIGINT or SIGTERM. Requests already in flight (an attach
/// waiting on its storage HEAD, say) are allowed to finish.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind lead API to {}", addr))?;

    tracing::info!(
        addr = %addr,
        max_image_mb = config.max_image_bytes() / 1024 / 1024,
        allowed_types = %config.allowed_image_types().join(","),
        picture_token_ttl_secs = config.picture_token_ttl_secs(),
        presigned_url_ttl_secs = config.storage().presigned_url_ttl_secs,
        "Lead API accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Lead API server failed")?;

    tracing::info!("Lead API stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A listener that cannot be installed is logged and
/// never fires, so the server keeps running on the other one.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "SIGINT", "Shutdown requested"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "Shutdown requested"),
    }

    tracing::info!("Draining in-flight lead and picture requests");
}
