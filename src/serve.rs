/// Local HTTP API exposing the latest metrics snapshot to the dashboard
/// front end, plus a live passthrough of the upstream exposition text.
use crate::config::ServeConfig;
use crate::fetch::MetricsClient;
use crate::model::MetricsRecord;
use crate::snapshot::{SharedSnapshot, Snapshot};
use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct AppState {
    snapshot: SharedSnapshot,
    client: MetricsClient,
}

pub async fn run(
    config: &ServeConfig,
    client: MetricsClient,
    snapshot: SharedSnapshot,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState { snapshot, client });

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("dashboard API listening on {local_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/metrics", get(api_metrics))
        .route("/api/snapshot", get(api_snapshot))
        .route("/api/metrics/raw", get(api_metrics_raw))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true}))
}

/// The latest fully-valid record, or 503 while none is available.
async fn api_metrics(
    State(state): State<AppState>,
) -> Result<Json<MetricsRecord>, (StatusCode, Json<serde_json::Value>)> {
    let snap = state.snapshot.read().await;
    match &snap.metrics {
        Some(record) => Ok(Json(record.clone())),
        None => {
            let details = snap
                .last_error
                .clone()
                .unwrap_or_else(|| "no successful refresh yet".to_string());
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "metrics unavailable",
                    "details": details,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            ))
        }
    }
}

/// The whole snapshot: record plus last-update and last-error bookkeeping.
async fn api_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshot.read().await.clone())
}

/// Live passthrough of the upstream exposition text.
async fn api_metrics_raw(
    State(state): State<AppState>,
) -> Result<([(HeaderName, &'static str); 2], String), (StatusCode, Json<serde_json::Value>)> {
    match state.client.fetch_raw().await {
        Ok(text) => Ok((
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            ],
            text,
        )),
        Err(e) => {
            tracing::warn!(error = %e, "raw metrics passthrough failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error": "Failed to fetch Sofia AI metrics",
                    "details": e.to_string(),
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "endpoint": state.client.endpoint(),
                })),
            ))
        }
    }
}
