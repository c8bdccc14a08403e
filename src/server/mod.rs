pub mod api;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::Result;
use crate::services::cache::SharedSnapshotCache;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedSnapshotCache,
}

/// Build the router. Split out from [`serve`] so tests can drive it
/// without binding a socket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/api/heatmap", get(api::heatmap_handler))
        .route("/api/health", get(api::health_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the axum server
pub async fn serve(cache: SharedSnapshotCache, port: u16) -> Result<()> {
    info!("Registering routes:");
    info!("  GET /api/heatmap");
    info!("  GET /api/health");

    let app = router(AppState { cache });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
}
