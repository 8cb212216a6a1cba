//! HTTP front-end.
//!
//! A thin axum layer over the [`Forecaster`](crate::service::Forecaster):
//!
//! - `GET /predict?item_name=...` → prediction for the configured target year
//! - `GET /health` → liveness plus the number of items being served
//! - `POST /reload` → re-read the data file and swap the snapshot
//!
//! The snapshot is shared through [`SharedSnapshot`]; each request works on
//! whichever snapshot was current when it started.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::ForecastConfig;
use crate::error::AppError;
use crate::service::SharedSnapshot;

pub mod routes;

/// Network and browser-access settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot: SharedSnapshot,
    pub config: Arc<ForecastConfig>,
}

impl AppState {
    pub fn new(snapshot: SharedSnapshot, config: ForecastConfig) -> Self {
        Self {
            snapshot,
            config: Arc::new(config),
        }
    }
}

/// Build the router with tracing and CORS middleware.
///
/// CORS covers the read-only routes only. `POST /reload` gets no CORS
/// headers: preflights for it fail and other origins can't read its
/// response.
pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router, AppError> {
    let cors = cors_layer(allowed_origins)?;

    let public = Router::new()
        .route("/predict", get(routes::predict))
        .route("/health", get(routes::health))
        .layer(cors);

    Ok(Router::new()
        .route("/reload", post(routes::reload))
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// CORS policy: listed origins, credentials allowed, any method and header.
///
/// Browsers reject a literal `*` for methods/headers on credentialed requests,
/// so both are mirrored from the preflight instead. An origin of `*` mirrors
/// the caller's origin, which lets any site make credentialed reads.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let origin = if allowed_origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o).map_err(|e| AppError::new(2, format!("Invalid CORS origin '{o}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, server: ServerConfig) -> Result<(), AppError> {
    let app = router(state, &server.allowed_origins)?;

    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| AppError::new(2, format!("Invalid HOST:PORT '{}:{}': {e}", server.host, server.port)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(4, format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("weekcast v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::new(4, format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
