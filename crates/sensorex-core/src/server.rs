//! Metrics HTTP server.
//!
//! Three routes: the exposition endpoint at the configured telemetry path,
//! `/ready` for probes, and a minimal landing page at `/`. Collectors do
//! blocking network and sysfs I/O, so the whole gather-and-encode runs in
//! a blocking task. Shutdown is graceful: the listener stops accepting and
//! in-flight scrapes complete.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::daemon::ShutdownSignal;

/// Errors from the serving task. Any of these (outside a requested
/// shutdown) is fatal for the exporter.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state for the route handlers.
pub struct AppState {
    pub registry: Registry,
    pub telemetry_path: String,
}

/// Build the router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let telemetry_path = state.telemetry_path.clone();
    Router::new()
        .route(&telemetry_path, get(handle_metrics))
        .route("/ready", get(handle_ready))
        .route("/", get(handle_index))
        .with_state(state)
}

/// Serve until the shutdown signal arrives.
pub async fn serve(
    listen_addr: &str,
    state: Arc<AppState>,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: listen_addr.to_string(),
            source,
        })?;
    info!(addr = listen_addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("HTTP server shutting down");
        })
        .await?;

    info!("HTTP server exited clean");
    Ok(())
}

// ── Route handlers ──────────────────────────────────────────────────────

async fn handle_metrics(State(state): State<Arc<AppState>>) -> Response {
    let registry = state.registry.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        let families = registry.gather();
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok::<_, prometheus::Error>(buf)
    })
    .await;

    match encoded {
        Ok(Ok(buf)) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], buf).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
        Err(e) => {
            error!(error = %e, "metrics gather task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics gather failed").into_response()
        }
    }
}

async fn handle_ready() -> StatusCode {
    StatusCode::OK
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Sensor Exporter</title></head>\n<body>\n\
         <h1>Sensor Exporter</h1>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         <p><small>sensorex {}</small></p>\n\
         </body>\n</html>\n",
        state.telemetry_path,
        crate::build_info::version_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{ChipCollector, ChipFamilySpecs};
    use crate::hwmon::{Chip, Feature};
    use axum::body::Body;
    use axum::http::Request;
    use crate::test_support::StaticChips;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let chips = StaticChips::new(vec![Chip {
            name: "coretemp-isa-0000".to_string(),
            adaptor: "ISA adapter".to_string(),
            features: vec![Feature {
                name: "temp1".to_string(),
                label: "Core 0".to_string(),
                value: 42.5,
            }],
        }]);
        let registry = Registry::new();
        registry
            .register(Box::new(ChipCollector::new(
                chips,
                ChipFamilySpecs::new().unwrap(),
            )))
            .unwrap();

        Arc::new(AppState {
            registry,
            telemetry_path: "/metrics".to_string(),
        })
    }

    async fn body_string(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let app = router(test_state());
        let req = Request::get("/ready").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_links_to_metrics_path() {
        let app = router(test_state());
        let req = Request::get("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_string(resp).await;
        assert!(body.contains("<a href=\"/metrics\">"));
        assert!(body.contains("Sensor Exporter"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_exposition_format() {
        let app = router(test_state());
        let req = Request::get("/metrics").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            prometheus::TEXT_FORMAT
        );

        let body = body_string(resp).await;
        assert!(body.contains("sensor_lm_temperature_celsius"));
        assert!(body.contains("temptype=\"Core 0\""));
        assert!(body.contains("42.5"));
    }

    #[tokio::test]
    async fn test_metrics_served_at_configured_path() {
        let registry = Registry::new();
        let state = Arc::new(AppState {
            registry,
            telemetry_path: "/prom".to_string(),
        });
        let app = router(state);

        let req = Request::get("/prom").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
