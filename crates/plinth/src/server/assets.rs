//! Asset Handler
//!
//! Serves static assets from the configured app root. A missing or
//! unreadable asset answers 404, which the asset monitor layer observes and
//! reports for scripts and stylesheets.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::fs;
use tracing::debug;

use super::state::AppState;

/// Serve one asset from the app root
pub async fn serve_asset(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    if !is_safe_path(&path) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let full = state.config().app_root.join(&path);
    match fs::read(&full).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, content_type_for(&path))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            debug!("Asset read failed for {}: {}", full.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Paths must stay inside the app root
fn is_safe_path(path: &str) -> bool {
    !path.starts_with('/') && !path.split('/').any(|segment| segment == "..")
}

fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "js" | "mjs" => "text/javascript",
        "css" => "text/css",
        "html" => "text/html; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("app.js"), "text/javascript");
        assert_eq!(content_type_for("chunks/vendor.mjs"), "text/javascript");
        assert_eq!(content_type_for("app.css"), "text/css");
        assert_eq!(content_type_for("logo.svg"), "image/svg+xml");
        assert_eq!(content_type_for("data.bin"), "application/octet-stream");
        assert_eq!(content_type_for("noextension"), "application/octet-stream");
    }

    #[test]
    fn test_traversal_is_rejected() {
        assert!(!is_safe_path("../secrets.toml"));
        assert!(!is_safe_path("a/../../b.js"));
        assert!(!is_safe_path("/etc/passwd"));
        assert!(is_safe_path("app.js"));
        assert!(is_safe_path("chunks/vendor.js"));
    }
}
