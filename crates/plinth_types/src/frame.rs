//! Live-Reload Frame Protocol
//!
//! Models the frames carried on the development server's live-reload
//! channel. The error bridge observes these to track the compile-error
//! lifecycle; clients consume them to apply updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sub-protocol name negotiated by live-reload connections
pub const LIVE_RELOAD_PROTOCOL: &str = "plinth-hmr";

/// Custom-frame event name used by the diagnostics checker channel
pub const CHECKER_EVENT: &str = "checker";

/// A frame on the live-reload channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Frame {
    /// Sent once when a client connects
    Connected,

    /// One or more modules were successfully updated
    Update {
        #[serde(default)]
        updates: Vec<UpdateItem>,
    },

    /// A transform/syntax error occurred
    Error {
        #[serde(default)]
        err: Option<FrameError>,
    },

    /// Out-of-band event; the checker channel uses `event = "checker"`
    Custom {
        event: String,
        #[serde(default)]
        data: Value,
    },

    /// The client should reload the whole page
    FullReload,

    /// Frame types this version does not know about
    #[serde(other)]
    Unknown,
}

/// A single updated module within an update frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItem {
    /// Root-relative path of the updated module
    pub path: String,
}

/// Error detail carried by an error frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameError {
    #[serde(default)]
    pub message: Option<String>,

    /// Originating module, when the transform pipeline knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Frame {
    /// Create an update frame for a set of changed module paths
    pub fn update(paths: impl IntoIterator<Item = String>) -> Self {
        Self::Update {
            updates: paths.into_iter().map(|path| UpdateItem { path }).collect(),
        }
    }

    /// Create an error frame
    pub fn error(
        message: impl Into<String>,
        id: Option<String>,
        stack: Option<String>,
    ) -> Self {
        Self::Error {
            err: Some(FrameError {
                message: Some(message.into()),
                id,
                stack,
            }),
        }
    }
}
