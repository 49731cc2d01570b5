//! HTTP server setup.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServiceError;
use crate::processor::OutlineProcessor;
use crate::routes;

/// Build the application router.
pub fn router(processor: Arc<OutlineProcessor>) -> Router {
    Router::new()
        .merge(routes::prompt_routes())
        .merge(routes::health_routes())
        .with_state(processor)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until the process is stopped.
pub async fn run_server(
    addr: SocketAddr,
    processor: Arc<OutlineProcessor>,
) -> Result<(), ServiceError> {
    run_server_with_shutdown(addr, processor, std::future::pending()).await
}

/// Run the HTTP server with graceful shutdown support.
///
/// Accepts a shutdown signal future that, when resolved, triggers graceful shutdown.
pub async fn run_server_with_shutdown<F>(
    addr: SocketAddr,
    processor: Arc<OutlineProcessor>,
    shutdown_signal: F,
) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        embedding = processor.embedding_backend_name(),
        clustering = processor.clustering_backend_name(),
        "Starting HTTP server on {}",
        addr
    );

    let app = router(processor);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("HTTP server ready on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}
