//! Checker Diagnostics
//!
//! Structured reports from the diagnostics checker channel, delivered as
//! custom frames on the live-reload channel. A batch arrives either directly
//! (`checker:error`) or as a reconnect payload containing multiple historical
//! batches (`checker:reconnect`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Checker event carrying a direct diagnostics batch
pub const CHECKER_ERROR_EVENT: &str = "checker:error";

/// Checker event carrying historical batches after a reconnect
pub const CHECKER_RECONNECT_EVENT: &str = "checker:reconnect";

/// Payload of a checker custom frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerPayload {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// A single diagnostic report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub message: String,

    /// Originating module id, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<DiagnosticLoc>,

    /// Severity; absent means error-level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<DiagnosticLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Source location of a diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticLoc {
    #[serde(default)]
    pub file: Option<String>,
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

impl Diagnostic {
    /// Whether this diagnostic is error-level. A missing severity field is
    /// treated as an error.
    pub fn is_error(&self) -> bool {
        self.level.is_none_or(|level| level == DiagnosticLevel::Error)
    }

    /// Originating file, preferring the explicit module id over the
    /// location's file field
    pub fn file(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or_else(|| self.loc.as_ref().and_then(|loc| loc.file.as_deref()))
    }
}

impl CheckerPayload {
    /// Flatten every diagnostic carried by this payload into one list.
    ///
    /// Entries that do not parse as diagnostics are skipped.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.event.as_str() {
            CHECKER_ERROR_EVENT => Self::batch_diagnostics(&self.data),
            CHECKER_RECONNECT_EVENT => match &self.data {
                Value::Array(entries) => entries
                    .iter()
                    .flat_map(|entry| Self::batch_diagnostics(&entry["data"]))
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn batch_diagnostics(batch: &Value) -> Vec<Diagnostic> {
        match batch.get("diagnostics") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}
