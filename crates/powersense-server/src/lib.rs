//! HTTP read surface over the power status cache.
//!
//! Handlers never touch the hardware. They clone the most recent reading
//! out of the shared [`StatusCache`], so response latency stays bounded
//! even when a vcgencmd invocation hangs — and they never fail due to an
//! upstream error: the latest reading is returned, degraded or not.

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use powersense_core::{DEGRADED_TEMP_LIMIT_C, Reading, StatusCache};

/// Shared server state.
struct AppState {
    cache: Arc<StatusCache>,
}

#[derive(Serialize)]
struct PowerResponse {
    #[serde(flatten)]
    reading: Reading,
    /// When the reading landed in the cache.
    cached_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct DegradedResponse {
    /// Any current throttle bit set, or temperature above the limit.
    degraded: bool,
    power: Reading,
}

async fn handle_power(State(state): State<Arc<AppState>>) -> Json<PowerResponse> {
    let snap = state.cache.snapshot();
    Json(PowerResponse {
        reading: snap.reading,
        cached_at: snap.cached_at,
    })
}

async fn handle_degraded(State(state): State<Arc<AppState>>) -> Json<DegradedResponse> {
    let snap = state.cache.snapshot();
    let degraded = snap.reading.degraded(DEGRADED_TEMP_LIMIT_C);
    Json(DegradedResponse {
        degraded,
        power: snap.reading,
    })
}

async fn handle_healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "powersense",
        "version": powersense_core::VERSION,
        "endpoints": {
            "/power": "Most recent power reading plus its cache arrival time",
            "/power/degraded": "Reading with a derived degraded flag",
            "/healthz": "Liveness check",
        },
    }))
}

/// Build the axum router over a shared cache.
pub fn build_router(cache: Arc<StatusCache>) -> Router {
    let state = Arc::new(AppState { cache });

    Router::new()
        .route("/", get(handle_index))
        .route("/power", get(handle_power))
        .route("/power/degraded", get(handle_degraded))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

/// Bind `listen` and serve until the process exits.
pub async fn run_server(cache: Arc<StatusCache>, listen: &str) -> std::io::Result<()> {
    let app = build_router(cache);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("listening on {listen}");
    axum::serve(listener, app).await
}
