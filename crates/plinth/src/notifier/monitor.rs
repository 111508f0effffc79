//! Asset Error Monitor
//!
//! Outermost middleware layer reporting script and stylesheet responses that
//! failed. Installed exactly once, at router construction, outside every
//! route and layer, so no asset failure can slip past it regardless of which
//! handler produced the response.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::server::AppState;

/// Middleware observing every response for failed asset loads
pub async fn asset_monitor(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let src = req.uri().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    if should_report(&path, response.status()) {
        state.notifier().report_asset_failure(&src);
    }

    response
}

/// Whether a response to `path` with `status` counts as an asset failure.
///
/// Only script and stylesheet requests are monitored; other resources fail
/// through other channels.
fn should_report(path: &str, status: StatusCode) -> bool {
    is_monitored_asset(path) && (status.is_client_error() || status.is_server_error())
}

fn is_monitored_asset(path: &str) -> bool {
    path.ends_with(".js") || path.ends_with(".mjs") || path.ends_with(".css")
}
