//! Parent Frame Transport
//!
//! The shell is designed to run embedded under a supervising host. When the
//! host spawns the shell it hands down a Unix socket path in
//! `PLINTH_PARENT_SOCKET`; every notification is written to that socket as
//! one JSON object per line. The host's identity is not verified on send;
//! the receiving side validates message shape and type.
//!
//! When the variable is absent the shell is its own top-level process and
//! every post is a silent no-op.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use plinth_types::Notification;

/// Environment variable naming the host's notification socket
pub const PARENT_SOCKET_ENV: &str = "PLINTH_PARENT_SOCKET";

/// Sink for notifications posted to the embedding host
pub trait ParentPort: Send + Sync {
    /// Deliver one notification. Must not panic; delivery is best-effort.
    fn send(&self, notification: &Notification);
}

/// Handle to the embedding host, if one exists
#[derive(Clone)]
pub struct ParentFrame {
    port: Option<Arc<dyn ParentPort>>,
}

impl ParentFrame {
    /// Detect the embedding host from the environment.
    ///
    /// A connection failure is logged and treated as detached; the shell
    /// keeps running either way.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(PARENT_SOCKET_ENV) else {
            debug!("No parent socket in environment, notifications disabled");
            return Self::detached();
        };

        match UnixStream::connect(&path) {
            Ok(stream) => {
                debug!("Connected to parent socket: {}", path);
                Self::attached_with(Arc::new(SocketPort::new(stream)))
            }
            Err(e) => {
                warn!("Failed to connect to parent socket {}: {}", path, e);
                Self::detached()
            }
        }
    }

    /// A frame with no embedding host; every post is a no-op
    pub fn detached() -> Self {
        Self { port: None }
    }

    /// A frame attached to the given port (tests inject a recording port)
    pub fn attached_with(port: Arc<dyn ParentPort>) -> Self {
        Self { port: Some(port) }
    }

    pub fn is_attached(&self) -> bool {
        self.port.is_some()
    }

    /// Post a notification to the host.
    ///
    /// Never fails visibly: detached frames drop the message, and transport
    /// errors are logged by the port, not propagated.
    pub fn post(&self, notification: Notification) {
        if let Some(port) = &self.port {
            port.send(&notification);
        }
    }
}

/// Port writing JSON lines to the host's Unix socket.
///
/// Writes happen under a mutex in `post` call order, which is the ordering
/// guarantee the protocol promises.
pub struct SocketPort {
    stream: Mutex<UnixStream>,
}

impl SocketPort {
    pub fn new(stream: UnixStream) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }
}

impl ParentPort for SocketPort {
    fn send(&self, notification: &Notification) {
        let line = match serde_json::to_string(notification) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize notification: {}", e);
                return;
            }
        };

        let mut stream = self.stream.lock();
        if let Err(e) = stream
            .write_all(line.as_bytes())
            .and_then(|_| stream.write_all(b"\n"))
        {
            warn!("Failed to notify parent: {}", e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::RecordingPort;
    use super::*;

    #[test]
    fn test_detached_post_is_silent() {
        let frame = ParentFrame::detached();
        assert!(!frame.is_attached());
        frame.post(Notification::app_ready(1));
        frame.post(Notification::CompileErrorResolved);
    }

    #[test]
    fn test_attached_posts_in_order() {
        let port = Arc::new(RecordingPort::default());
        let frame = ParentFrame::attached_with(port.clone());
        assert!(frame.is_attached());

        frame.post(Notification::app_ready(1));
        frame.post(Notification::runtime_error("boom", None, None));

        assert_eq!(port.sent_kinds(), vec!["app_ready", "runtime_error"]);
    }
}
