//! Runtime Notifier
//!
//! Informs the embedding host that the shell has initialized, that
//! initialization failed, or that an asset failed to load. One notifier is
//! constructed at startup and shared; every send is best-effort and never
//! interferes with serving.

mod monitor;
mod parent;

pub use monitor::*;
pub use parent::*;

#[cfg(test)]
pub(crate) use parent::fake;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, error};

use plinth_types::Notification;

use crate::clock::Clock;

/// Reports mount lifecycle to the embedding host
#[derive(Clone)]
pub struct RuntimeNotifier {
    frame: ParentFrame,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    idle_gate: watch::Receiver<bool>,
}

impl RuntimeNotifier {
    /// Create a notifier.
    ///
    /// `idle_gate` is flipped to `true` by the serve loop once startup work
    /// has drained; `idle_timeout` bounds how long the ready notification
    /// waits for that signal.
    pub fn new(
        frame: ParentFrame,
        clock: Arc<dyn Clock>,
        idle_timeout: Duration,
        idle_gate: watch::Receiver<bool>,
    ) -> Self {
        Self {
            frame,
            clock,
            idle_timeout,
            idle_gate,
        }
    }

    /// The underlying parent frame
    pub fn frame(&self) -> &ParentFrame {
        &self.frame
    }

    /// Announce a successful first mount.
    ///
    /// Invoked once, after the listener is bound. The send is deferred until
    /// the idle gate opens, bounded by the idle timeout; if the gate's sender
    /// is gone the send happens on the soonest task tick.
    pub fn notify_ready(&self) {
        let frame = self.frame.clone();
        let clock = self.clock.clone();
        let gate = self.idle_gate.clone();
        let bound = self.idle_timeout;

        tokio::spawn(async move {
            wait_for_idle(gate, bound).await;
            let mount_time = clock.now_ms();
            debug!("Announcing app ready (mount time {})", mount_time);
            frame.post(Notification::app_ready(mount_time));
        });
    }

    /// Announce an initialization failure
    pub fn notify_error(&self, kind: &str, message: Option<&str>) {
        let mut details = Map::new();
        if let Some(message) = message {
            details.insert("message".to_string(), Value::String(message.to_string()));
        }
        self.frame.post(Notification::app_error_with(kind, details));
    }

    /// Announce a script or stylesheet that failed to load
    pub fn report_asset_failure(&self, src: &str) {
        error!("Asset failed to load: {}", src);
        self.frame.post(Notification::asset_load_failure(src));
    }
}

/// Wait for the idle gate to open, up to `bound`.
///
/// A dropped gate sender means no idle signal is wired; the wait degrades to
/// the soonest task tick. The bound fires unconditionally either way.
async fn wait_for_idle(mut gate: watch::Receiver<bool>, bound: Duration) {
    let idle = async {
        loop {
            if *gate.borrow_and_update() {
                break;
            }
            if gate.changed().await.is_err() {
                break;
            }
        }
    };
    let _ = tokio::time::timeout(bound, idle).await;
}
