//! HTTP server exposing a registry's metrics to scrapers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use vitals_core::{text, CollectorRegistry, TEXT_CONTENT_TYPE};

use crate::config::ExporterConfig;
use crate::error::{ExporterError, ExporterResult};

/// HTTP exporter serving the text exposition format.
///
/// On each request to `/metrics` the exporter collects the registry with the
/// sorted strategy, renders the result, and writes it with the exposition
/// content type. All metric state lives in the registry; the exporter itself
/// is stateless and cheap to clone.
#[derive(Debug, Clone)]
pub struct MetricsExporter {
    config: ExporterConfig,
    registry: Arc<CollectorRegistry>,
}

impl MetricsExporter {
    /// Creates an exporter serving the given registry.
    #[must_use]
    pub const fn new(config: ExporterConfig, registry: Arc<CollectorRegistry>) -> Self {
        Self { config, registry }
    }

    /// Creates an exporter serving the process-wide default registry.
    #[must_use]
    pub fn with_global(config: ExporterConfig) -> Self {
        Self::new(config, CollectorRegistry::global())
    }

    /// Returns the exporter configuration.
    #[must_use]
    pub const fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Returns the registry this exporter serves.
    #[must_use]
    pub fn registry(&self) -> Arc<CollectorRegistry> {
        Arc::clone(&self.registry)
    }

    /// Builds the router serving `/` and `/metrics`.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(root_pointer))
            .route("/metrics", get(serve_metrics))
            .with_state(Arc::clone(&self.registry))
            .layer(TraceLayer::new_for_http())
    }

    /// Starts the exporter and serves until the server stops.
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::BindFailed` if the listener cannot bind and
    /// `ExporterError::Internal` if the server stops with an error.
    pub async fn serve(&self) -> ExporterResult<()> {
        let listener = self.bind().await?;
        axum::serve(listener, self.router())
            .await
            .map_err(|e| ExporterError::Internal(e.to_string()))
    }

    /// Starts the exporter with graceful shutdown support.
    ///
    /// The server shuts down when the provided future completes.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`serve`](Self::serve).
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ExporterResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ExporterError::Internal(e.to_string()))
    }

    async fn bind(&self) -> ExporterResult<TcpListener> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ExporterError::BindFailed(addr, e))?;
        info!(addr = %addr, "metrics exporter listening");
        Ok(listener)
    }
}

/// Handles `GET /`.
async fn root_pointer() -> &'static str {
    "See /metrics"
}

/// Handles `GET /metrics`.
///
/// A collection or formatting failure is fatal for this request only: the
/// scraper sees a 500 and the process keeps running.
async fn serve_metrics(State(registry): State<Arc<CollectorRegistry>>) -> Response {
    let mut body = String::new();
    match text::encode(&mut body, &registry) {
        Ok(()) => ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response(),
        Err(error) => {
            error!(%error, "metrics collection failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
