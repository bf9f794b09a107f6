//! HTTP server for the Prometheus metrics endpoint.

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::Registry;
use tracing::{error, info};

use crate::error::ExporterError;
use crate::metrics::prom;

/// HTTP server exposing a registry on `/metrics`.
pub struct MetricsServer {
    bind_addr: SocketAddr,
    registry: Registry,
}

impl MetricsServer {
    pub fn new(bind_addr: SocketAddr, registry: Registry) -> Self {
        Self {
            bind_addr,
            registry,
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(self.registry.clone())
    }

    /// Starts the HTTP server.
    ///
    /// Runs until Ctrl-C or SIGTERM is received.
    pub async fn run(self) -> Result<(), ExporterError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        info!(addr = %self.bind_addr, "Metrics server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ExporterError::Server {
                message: e.to_string(),
            })?;

        info!("Metrics server stopped");
        Ok(())
    }
}

/// Handler for the /metrics endpoint.
///
/// A scrape walks the filesystem, so it runs on the blocking thread pool.
async fn metrics_handler(State(registry): State<Registry>) -> impl IntoResponse {
    let encoded = tokio::task::spawn_blocking(move || prom::encode(&registry)).await;

    match encoded {
        Ok(Ok(output)) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {}", e),
            )
        }
        Err(e) => {
            error!(error = %e, "Metrics collection task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("Metrics collection failed: {}", e),
            )
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CertificateCollector;
    use crate::discovery::SearchConfig;
    use crate::metrics::build_registry;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_metrics_handler_reports_load_errors() {
        let collector = CertificateCollector::new(SearchConfig::new(vec![PathBuf::from(
            "/nonexistent/certificate-exporter.pem",
        )]))
        .unwrap();
        let registry = build_registry(collector).unwrap();

        let response = metrics_handler(State(registry)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(
            "certificateexporter_load_error{path=\"/nonexistent/certificate-exporter.pem\"} 1"
        ));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
