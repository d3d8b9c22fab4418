//! HTTP server exposing the probe endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::ExporterConfig;
use crate::exposition::{self, CONTENT_TYPE};
use crate::probe::run_probe;
use crate::telemetry::SharedMetrics;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<ExporterConfig>,
    metrics: SharedMetrics,
}

#[derive(Debug, Deserialize)]
struct ProbeParams {
    target: Option<String>,
}

/// Create the HTTP router.
fn create_router(config: Arc<ExporterConfig>, metrics: SharedMetrics) -> Router {
    let probe_path = config.server.probe_path.clone();
    let metrics_path = config.server.metrics_path.clone();
    let state = AppState { config, metrics };

    Router::new()
        .route(&probe_path, get(probe_handler))
        .route(&metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the probe endpoint.
async fn probe_handler(
    State(state): State<AppState>,
    Query(params): Query<ProbeParams>,
) -> Response {
    let Some(target) = params.target.filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing target parameter\n").into_response();
    };

    let Some((url, target_config)) = state.config.target(&target) else {
        tracing::debug!(target = %target, "Probe requested for unconfigured target");
        return (
            StatusCode::UNAUTHORIZED,
            "no API token configured for target\n",
        )
            .into_response();
    };

    let options = match target_config.probe_options(&state.config.scrape) {
        Ok(options) => options,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e)).into_response();
        }
    };

    let result = run_probe(
        url,
        target_config.clone(),
        options,
        &state.config.scrape,
        &state.metrics,
    )
    .await;
    let body = exposition::render(&result.metrics, result.success(), result.elapsed);

    (StatusCode::OK, [("content-type", CONTENT_TYPE)], body).into_response()
}

/// Handler for the exporter's own metrics.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = state.metrics.render();

    (
        StatusCode::OK,
        [(
            "content-type",
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    config: Arc<ExporterConfig>,
    metrics: SharedMetrics,
    listen_addr: SocketAddr,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(config: Arc<ExporterConfig>, metrics: SharedMetrics, listen_addr: SocketAddr) -> Self {
        Self {
            config,
            metrics,
            listen_addr,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!(
            addr = %addr,
            probe_path = %self.config.server.probe_path,
            targets = self.config.targets.len(),
            "HTTP server listening"
        );

        let router = create_router(self.config, self.metrics);

        // Run server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ExporterMetrics;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_router(config: &str) -> Router {
        let config = Arc::new(ExporterConfig::parse(config).unwrap());
        create_router(config, Arc::new(ExporterMetrics::new()))
    }

    #[tokio::test]
    async fn test_probe_without_target() {
        let router = make_router("{}");

        let response = router
            .oneshot(Request::get("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_probe_unknown_target() {
        let router = make_router(r#"{ targets: { "fw01.example.net": { token: "t" } } }"#);

        let response = router
            .oneshot(
                Request::get("/probe?target=fw02.example.net")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let router = make_router("{}");

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("fortigate_exporter_probe_duration_seconds"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = make_router("{}");

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_custom_paths() {
        let router = make_router(
            r#"{ server: { probe_path: "/fortigate", metrics_path: "/internal/metrics" } }"#,
        );

        let response = router
            .clone()
            .oneshot(Request::get("/fortigate").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .clone()
            .oneshot(
                Request::get("/internal/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Default paths should 404
        let response = router
            .oneshot(Request::get("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
