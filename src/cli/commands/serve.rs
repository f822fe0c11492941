use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tower_sessions::ExpiredDeletion;
use tracing::{error, info};

use crate::api;
use crate::config::Config;
use crate::constants::intervals::EXPIRED_SESSION_SWEEP;
use crate::state::SharedState;

pub async fn cmd_serve(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "visitrack v{} starting web server...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let state = api::create_app_state(shared, prometheus_handle).await?;

    let sweeper = {
        let store = state.session_store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.continuously_delete_expired(EXPIRED_SESSION_SWEEP).await {
                error!("Expired session cleanup stopped: {}", e);
            }
        })
    };

    let app = api::router(state).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Web Server running at http://{}", addr);

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    sweeper.abort();
    info!("Server stopped");

    result.map_err(Into::into)
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
