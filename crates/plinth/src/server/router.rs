//! HTTP Router
//!
//! Sets up the axum router: placeholder pages, asset handler, live-reload
//! endpoint, readiness probe, and the server-layer middleware stack.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::clock::{Clock, SystemClock};
use crate::notifier::asset_monitor;

use super::allow::enforce_allowed_hosts;
use super::assets::serve_asset;
use super::hmr::hmr_upgrade;
use super::pages::{home, not_found};
use super::state::AppState;

/// Create the application router.
///
/// Layer order matters: the host allow-list is outermost so nothing is
/// served to a disallowed host, and the asset monitor sits directly inside
/// it so every asset response is observed no matter which route produced
/// it.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/assets/*path", get(serve_asset))
        // Live-reload endpoint - clients negotiate the sub-protocol here
        .route("/hmr", get(hmr_upgrade))
        // Readiness probe for orchestration tooling
        .route("/health", get(health_probe))
        // Checker tooling posts diagnostic frames here
        .route("/__diagnostics", post(ingest_diagnostics))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        // CORS for development
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), asset_monitor))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_allowed_hosts,
        ))
        .with_state(state)
}

/// Readiness probe response
#[derive(Serialize)]
struct ProbeResponse {
    status: &'static str,
    timestamp: u64,
}

/// Readiness probe; answers once the listener is up
async fn health_probe() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "ok",
        timestamp: SystemClock.now_ms(),
    })
}

/// Publish a raw frame onto the live-reload channel
async fn ingest_diagnostics(State(state): State<AppState>, body: String) -> StatusCode {
    state.hub().publish_raw(body);
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_reports_ok_with_timestamp() {
        let Json(probe) = health_probe().await;
        assert_eq!(probe.status, "ok");
        assert!(probe.timestamp > 0);

        let json = serde_json::to_value(&probe).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_u64());
    }
}
