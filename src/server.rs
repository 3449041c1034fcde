//! HTTP server (component K): serves the density map at `GET /data` and
//! the visualization's static assets, with permissive CORS.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ConfigError;
use crate::reporter::DensityHandle;

#[derive(Clone)]
struct AppState {
    density: DensityHandle,
}

async fn data_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bytes = state.density.snapshot();
    ([(header::CONTENT_TYPE, "application/octet-stream")], bytes)
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

fn build_router(static_dir: PathBuf, density: DensityHandle) -> Router {
    let state = AppState { density };

    Router::new()
        .route("/data", get(data_handler))
        .route("/health", get(health_handler))
        .nest_service("/", ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `shutdown` observes `true`, at which point the
/// server stops accepting new connections and this future resolves.
pub async fn serve(
    bind_addr: &str,
    static_dir: PathBuf,
    density: DensityHandle,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConfigError> {
    let app = build_router(static_dir, density);

    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|_| ConfigError::InvalidBindAddress { addr: bind_addr.to_string() })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ConfigError::BindFailed { addr: bind_addr.to_string(), source })?;

    tracing::info!(%addr, "density endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
            tracing::info!("http server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "http server exited with error");
            ConfigError::BindFailed { addr: bind_addr.to_string(), source: std::io::Error::new(std::io::ErrorKind::Other, e) }
        })
}
