//! Notification Protocol
//!
//! Defines the messages the shell posts to its embedding host. The host's
//! origin is not known in advance, so nothing on the sending side restricts
//! delivery; the receiver validates message shape and type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reason code for a missing mount point.
pub const ERROR_ROOT_NOT_FOUND: &str = "root_not_found";

/// Reason code for a failed mount.
pub const ERROR_RENDER_FAILURE: &str = "render_failure";

/// Reason code for a script or stylesheet that failed to load.
pub const ERROR_ASSET_LOAD_FAILURE: &str = "asset_load_failure";

/// Messages posted to the embedding host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    /// The shell finished its first successful mount
    AppReady {
        /// Mount completion time, epoch milliseconds
        #[serde(rename = "mountTime")]
        mount_time: u64,
    },

    /// The shell failed to initialize, or an asset failed to load
    AppError {
        /// Reason code (`root_not_found`, `render_failure`,
        /// `asset_load_failure`, ...)
        #[serde(rename = "type")]
        kind: String,

        /// Arbitrary extra fields, shape dependent on the reason code
        #[serde(flatten)]
        details: Map<String, Value>,
    },

    /// An uncaught error escaped the running application
    RuntimeError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
    },

    /// A transform/syntax error or an error-level checker diagnostic
    CompileError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },

    /// The first successful update after a prior compile error
    CompileErrorResolved,
}

impl Notification {
    /// Create an app-ready notification
    pub fn app_ready(mount_time: u64) -> Self {
        Self::AppReady { mount_time }
    }

    /// Create an app-error notification with no extra detail
    pub fn app_error(kind: impl Into<String>) -> Self {
        Self::AppError {
            kind: kind.into(),
            details: Map::new(),
        }
    }

    /// Create an app-error notification with extra detail fields
    pub fn app_error_with(kind: impl Into<String>, details: Map<String, Value>) -> Self {
        Self::AppError {
            kind: kind.into(),
            details,
        }
    }

    /// Create an asset-load-failure notification for the given resource URL
    pub fn asset_load_failure(src: impl Into<String>) -> Self {
        let mut details = Map::new();
        details.insert("src".to_string(), Value::String(src.into()));
        Self::AppError {
            kind: ERROR_ASSET_LOAD_FAILURE.to_string(),
            details,
        }
    }

    /// Create a runtime-error notification
    pub fn runtime_error(
        message: impl Into<String>,
        file: Option<String>,
        line: Option<u32>,
    ) -> Self {
        Self::RuntimeError {
            message: message.into(),
            file,
            line,
        }
    }

    /// Create a compile-error notification
    pub fn compile_error(
        message: impl Into<String>,
        file: Option<String>,
        stack: Option<String>,
    ) -> Self {
        Self::CompileError {
            message: message.into(),
            file,
            stack,
        }
    }

    /// Wire tag for this notification
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AppReady { .. } => "app_ready",
            Self::AppError { .. } => "app_error",
            Self::RuntimeError { .. } => "runtime_error",
            Self::CompileError { .. } => "compile_error",
            Self::CompileErrorResolved => "compile_error_resolved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_ready_serialize() {
        let msg = Notification::app_ready(1_700_000_000_000);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"app_ready\""));
        assert!(json.contains("\"mountTime\":1700000000000"));
    }

    #[test]
    fn test_app_error_reason_code_field() {
        let msg = Notification::asset_load_failure("/assets/app.js");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "app_error");
        assert_eq!(json["payload"]["type"], ERROR_ASSET_LOAD_FAILURE);
        assert_eq!(json["payload"]["src"], "/assets/app.js");
    }

    #[test]
    fn test_runtime_error_omits_absent_location() {
        let msg = Notification::runtime_error("boom", None, None);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"message\":\"boom\""));
        assert!(!json.contains("file"));
        assert!(!json.contains("line"));
    }

    #[test]
    fn test_resolved_has_no_payload() {
        let json = serde_json::to_string(&Notification::CompileErrorResolved).unwrap();
        assert_eq!(json, "{\"type\":\"compile_error_resolved\"}");
    }

    #[test]
    fn test_round_trip() {
        let msg = Notification::compile_error(
            "expected `;`",
            Some("src/pages/home.rs".to_string()),
            None,
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
