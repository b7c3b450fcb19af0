//! HTTP server initialization and runtime setup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;

use crate::api::routes::app_router;
use crate::config::Config;
use crate::state::AppState;

/// How often expired rate-limit buckets are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if the bind address is invalid, the bind fails, or the
/// server errors at runtime.
pub async fn run(config: Config) -> Result<()> {
    let state = AppState::new(&config);

    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            tick.tick().await;
            limiter.prune();
        }
    });
    tracing::info!("Rate-limit bucket pruner started");

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler");
    } else {
        tracing::info!("shutdown signal received");
    }
}
