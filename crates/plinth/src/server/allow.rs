//! Host Allow-List
//!
//! The development server only answers requests addressed to an allowed
//! host. Entries are exact hostnames or leading-dot suffixes (`.modal.host`
//! matches the domain and all of its subdomains). Rejection happens at the
//! server layer, before any application route runs.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::state::AppState;

/// Middleware rejecting requests from hosts outside the allow-list
pub async fn enforce_allowed_hosts(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let allowed = {
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| req.uri().host())
            .unwrap_or("");
        if host_allowed(host, &state.config().allowed_hosts) {
            true
        } else {
            warn!("Blocked request for disallowed host: {:?}", host);
            false
        }
    };

    if !allowed {
        return (StatusCode::FORBIDDEN, "Blocked host").into_response();
    }

    next.run(req).await
}

/// Whether `host` (optionally carrying a port) matches the allow-list
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    if host.is_empty() {
        return false;
    }

    let host = strip_port(host).to_ascii_lowercase();

    allowed.iter().any(|entry| match entry.strip_prefix('.') {
        // ".modal.host" matches both "modal.host" and "x.modal.host"
        Some(root) => host == root || host.ends_with(entry.as_str()),
        None => host == *entry,
    })
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_host_allowed() {
        let allowed = allow(&["localhost", "127.0.0.1"]);
        assert!(host_allowed("localhost", &allowed));
        assert!(host_allowed("127.0.0.1", &allowed));
        assert!(!host_allowed("evil.example", &allowed));
    }

    #[test]
    fn test_port_is_ignored() {
        let allowed = allow(&["localhost"]);
        assert!(host_allowed("localhost:5173", &allowed));
        assert!(host_allowed("localhost:80", &allowed));
    }

    #[test]
    fn test_suffix_matches_domain_and_subdomains() {
        let allowed = allow(&[".modal.host"]);
        assert!(host_allowed("modal.host", &allowed));
        assert!(host_allowed("preview-1234.modal.host", &allowed));
        assert!(host_allowed("a.b.modal.host:5173", &allowed));
        assert!(!host_allowed("notmodal.host", &allowed));
        assert!(!host_allowed("modal.host.evil.example", &allowed));
    }

    #[test]
    fn test_host_comparison_is_case_insensitive() {
        let allowed = allow(&["localhost", ".daytona.io"]);
        assert!(host_allowed("LocalHost", &allowed));
        assert!(host_allowed("Preview.Daytona.IO", &allowed));
    }

    #[test]
    fn test_missing_host_rejected() {
        assert!(!host_allowed("", &allow(&["localhost"])));
    }
}
