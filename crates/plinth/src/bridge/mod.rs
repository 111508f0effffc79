//! Development Error Bridge
//!
//! Surfaces compile, checker, and runtime errors from the development
//! session to the embedding host in near real time, with noise suppression.
//!
//! The bridge is constructed once at startup and owns all of its state: the
//! two compile-error flags and the runtime-error dedup map. It observes the
//! live-reload channel through the hub's single subscription point and
//! receives runtime errors from the panic/task feeds; everything it learns
//! is relayed as notifications through the parent frame.

mod dedup;
mod feeds;

pub use dedup::*;
pub use feeds::*;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

use plinth_types::{CheckerPayload, Diagnostic, Frame, FrameError, Notification, CHECKER_EVENT};

use crate::clock::Clock;
use crate::notifier::ParentFrame;

/// Message substituted when an error frame carries no detail
const UNKNOWN_COMPILE_ERROR: &str = "unknown compile error";

/// Relays development-session errors to the embedding host
pub struct DevBridge {
    frame: ParentFrame,
    dedup: ErrorDedup,
    /// A transform/syntax error is active and unresolved
    compile_error: bool,
    /// A checker diagnostic batch is active and unresolved
    checker_error: bool,
}

impl DevBridge {
    pub fn new(frame: ParentFrame, clock: Arc<dyn Clock>, dedup_window: Duration) -> Self {
        Self {
            frame,
            dedup: ErrorDedup::new(dedup_window, clock),
            compile_error: false,
            checker_error: false,
        }
    }

    /// Drive the bridge until both feeds close.
    ///
    /// `frames` is the live-reload tap from `LiveReloadHub::subscribe`;
    /// `errors` carries reports from the panic hook and supervised tasks.
    pub async fn run(
        mut self,
        mut frames: broadcast::Receiver<String>,
        mut errors: mpsc::UnboundedReceiver<RuntimeErrorReport>,
    ) {
        debug!("Error bridge started");
        let mut frames_open = true;
        let mut errors_open = true;
        while frames_open || errors_open {
            tokio::select! {
                frame = frames.recv(), if frames_open => match frame {
                    Ok(text) => self.handle_raw_frame(&text),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Live-reload tap lagged, {} frames dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => frames_open = false,
                },
                report = errors.recv(), if errors_open => match report {
                    Some(report) => self.report_runtime_error(
                        &report.message,
                        report.file.as_deref(),
                        report.line,
                    ),
                    None => errors_open = false,
                },
            }
        }
        debug!("Error bridge stopped");
    }

    /// Handle one raw text frame from the live-reload channel.
    ///
    /// Non-JSON or malformed frames are dropped without a sound; they must
    /// never crash the bridge.
    pub fn handle_raw_frame(&mut self, text: &str) {
        match serde_json::from_str::<Frame>(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(_) => trace!("Ignoring malformed live-reload frame"),
        }
    }

    /// Handle one parsed live-reload frame
    pub fn handle_frame(&mut self, frame: Frame) {
        match frame {
            Frame::Error { err } => self.on_transform_error(err),
            Frame::Update { .. } => self.on_update(),
            Frame::Custom { event, data } if event == CHECKER_EVENT => self.on_checker_event(data),
            _ => {}
        }
    }

    /// Relay a runtime error, suppressing repeats within the dedup window
    pub fn report_runtime_error(&mut self, message: &str, file: Option<&str>, line: Option<u32>) {
        let key = ErrorDedup::key(message, file, line);
        if !self.dedup.should_send(&key) {
            trace!("Suppressing duplicate runtime error: {}", key);
            return;
        }
        self.frame.post(Notification::runtime_error(
            message,
            file.map(str::to_string),
            line,
        ));
    }

    fn on_transform_error(&mut self, err: Option<FrameError>) {
        self.compile_error = true;
        let (message, file, stack) = match err {
            Some(err) => (
                err.message
                    .unwrap_or_else(|| UNKNOWN_COMPILE_ERROR.to_string()),
                err.id,
                err.stack,
            ),
            None => (UNKNOWN_COMPILE_ERROR.to_string(), None, None),
        };
        self.frame
            .post(Notification::compile_error(message, file, stack));
    }

    fn on_update(&mut self) {
        if self.compile_error {
            self.compile_error = false;
            self.frame.post(Notification::CompileErrorResolved);
        }
    }

    fn on_checker_event(&mut self, data: Value) {
        // Syntax errors take priority; checker traffic waits until clean.
        if self.compile_error {
            return;
        }

        let Ok(payload) = serde_json::from_value::<CheckerPayload>(data) else {
            return;
        };

        let errors: Vec<Diagnostic> = payload
            .diagnostics()
            .into_iter()
            .filter(Diagnostic::is_error)
            .collect();

        if !errors.is_empty() {
            self.checker_error = true;
            for diag in errors {
                let file = diag.file().map(str::to_string);
                self.frame
                    .post(Notification::compile_error(diag.message, file, diag.stack));
            }
        } else if self.checker_error {
            self.checker_error = false;
            self.frame.post(Notification::CompileErrorResolved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fake::ManualClock;
    use crate::notifier::fake::RecordingPort;
    use serde_json::json;

    fn bridge_with(port: Arc<RecordingPort>, clock: Arc<ManualClock>) -> DevBridge {
        DevBridge::new(
            ParentFrame::attached_with(port),
            clock,
            Duration::from_millis(5000),
        )
    }

    fn bridge(port: Arc<RecordingPort>) -> DevBridge {
        bridge_with(port, Arc::new(ManualClock::at(0)))
    }

    fn checker_error_frame(diagnostics: Value) -> Frame {
        Frame::Custom {
            event: CHECKER_EVENT.to_string(),
            data: json!({
                "event": "checker:error",
                "data": {"diagnostics": diagnostics},
            }),
        }
    }

    #[test]
    fn test_error_then_update_yields_exactly_one_pair() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(Frame::error("expected `;`", None, None));
        bridge.handle_frame(Frame::update(["src/app.rs".to_string()]));

        assert_eq!(
            port.sent_kinds(),
            vec!["compile_error", "compile_error_resolved"]
        );
    }

    #[test]
    fn test_update_without_prior_error_emits_nothing() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(Frame::update(["src/app.rs".to_string()]));

        assert!(port.sent().is_empty());
    }

    #[test]
    fn test_two_errors_without_update_yield_no_resolved() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(Frame::error("first", None, None));
        bridge.handle_frame(Frame::error("second", None, None));

        assert_eq!(port.sent_kinds(), vec!["compile_error", "compile_error"]);
    }

    #[test]
    fn test_error_frame_without_detail_uses_fallback_message() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(Frame::Error { err: None });

        assert_eq!(
            port.sent()[0],
            Notification::compile_error(UNKNOWN_COMPILE_ERROR, None, None)
        );
    }

    #[test]
    fn test_checker_suppressed_while_syntax_error_active() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(Frame::error("syntax", None, None));
        bridge.handle_frame(checker_error_frame(json!([{"message": "type mismatch"}])));
        assert_eq!(port.sent_kinds(), vec!["compile_error"]);

        // resolving the syntax error lets checker traffic through again
        bridge.handle_frame(Frame::update(["src/app.rs".to_string()]));
        bridge.handle_frame(checker_error_frame(json!([{"message": "type mismatch"}])));

        assert_eq!(
            port.sent_kinds(),
            vec!["compile_error", "compile_error_resolved", "compile_error"]
        );
    }

    #[test]
    fn test_each_checker_diagnostic_is_its_own_message() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(checker_error_frame(json!([
            {"message": "a", "id": "src/a.rs"},
            {"message": "b", "loc": {"file": "src/b.rs"}},
        ])));

        let sent = port.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0],
            Notification::compile_error("a", Some("src/a.rs".to_string()), None)
        );
        assert_eq!(
            sent[1],
            Notification::compile_error("b", Some("src/b.rs".to_string()), None)
        );
    }

    #[test]
    fn test_diagnostic_without_level_is_forwarded() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(checker_error_frame(json!([{"message": "no level"}])));

        assert_eq!(port.sent_kinds(), vec!["compile_error"]);
    }

    #[test]
    fn test_warning_diagnostics_are_filtered_out() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(checker_error_frame(json!([
            {"message": "unused import", "level": "warning"},
        ])));

        assert!(port.sent().is_empty());
    }

    #[test]
    fn test_clean_checker_batch_resolves_prior_checker_errors() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(checker_error_frame(json!([{"message": "type mismatch"}])));
        bridge.handle_frame(checker_error_frame(json!([])));

        assert_eq!(
            port.sent_kinds(),
            vec!["compile_error", "compile_error_resolved"]
        );
    }

    #[test]
    fn test_clean_checker_batch_without_prior_errors_is_silent() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(checker_error_frame(json!([])));

        assert!(port.sent().is_empty());
    }

    #[test]
    fn test_reconnect_payload_flattens_historical_batches() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_frame(Frame::Custom {
            event: CHECKER_EVENT.to_string(),
            data: json!({
                "event": "checker:reconnect",
                "data": [
                    {"data": {"diagnostics": [{"message": "a"}]}},
                    {"data": {"diagnostics": [{"message": "b"}]}},
                ],
            }),
        });

        assert_eq!(port.sent_kinds(), vec!["compile_error", "compile_error"]);
    }

    #[test]
    fn test_malformed_frames_are_swallowed() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.handle_raw_frame("not json at all");
        bridge.handle_raw_frame("{\"type\":");
        bridge.handle_raw_frame("42");
        assert!(port.sent().is_empty());

        // the bridge keeps working afterwards
        bridge.handle_raw_frame(r#"{"type":"error","err":{"message":"boom"}}"#);
        assert_eq!(port.sent_kinds(), vec!["compile_error"]);
    }

    #[test]
    fn test_runtime_error_dedup_within_window() {
        let port = Arc::new(RecordingPort::default());
        let clock = Arc::new(ManualClock::at(0));
        let mut bridge = bridge_with(port.clone(), clock.clone());

        bridge.report_runtime_error("boom", Some("app.rs"), Some(3));
        clock.advance(1000);
        bridge.report_runtime_error("boom", Some("app.rs"), Some(3));
        assert_eq!(port.sent().len(), 1);

        clock.advance(4000);
        bridge.report_runtime_error("boom", Some("app.rs"), Some(3));
        assert_eq!(port.sent().len(), 2);
    }

    #[test]
    fn test_runtime_errors_with_distinct_locations_both_sent() {
        let port = Arc::new(RecordingPort::default());
        let mut bridge = bridge(port.clone());

        bridge.report_runtime_error("boom", Some("app.rs"), Some(3));
        bridge.report_runtime_error("boom", Some("app.rs"), Some(4));

        assert_eq!(port.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_run_relays_both_feeds_until_closed() {
        let port = Arc::new(RecordingPort::default());
        let bridge = bridge(port.clone());

        let (frame_tx, frame_rx) = broadcast::channel(16);
        let (err_tx, err_rx) = mpsc::unbounded_channel();

        frame_tx
            .send(r#"{"type":"error","err":{"message":"boom"}}"#.to_string())
            .unwrap();
        err_tx
            .send(RuntimeErrorReport {
                message: "panic".to_string(),
                file: Some("app.rs".to_string()),
                line: Some(7),
            })
            .unwrap();

        let handle = tokio::spawn(bridge.run(frame_rx, err_rx));
        tokio::task::yield_now().await;
        drop(frame_tx);
        drop(err_tx);
        handle.await.unwrap();

        let mut kinds = port.sent_kinds();
        kinds.sort_unstable();
        assert_eq!(kinds, vec!["compile_error", "runtime_error"]);
    }
}
