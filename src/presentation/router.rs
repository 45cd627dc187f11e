// Router and server startup
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_custom_series, get_range, get_series, health_check, list_metrics, put_range, stream_events,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/metrics", get(list_metrics))
        .route("/series/:name", get(get_series))
        .route("/range", get(get_range).put(put_range))
        .route("/custom", post(add_custom_series))
        .route("/events", get(stream_events))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve in the background until the returned sender fires.
pub async fn run(
    addr: SocketAddr,
    state: Arc<AppState>,
) -> anyhow::Result<(SocketAddr, oneshot::Sender<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let router = build_router(state);

    tracing::info!("Health dashboard listening on http://{}", local_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((local_addr, shutdown_tx))
}
