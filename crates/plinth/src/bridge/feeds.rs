//! Runtime Error Feeds
//!
//! Two sources feed the bridge's runtime-error relay: a process panic hook
//! for uncaught panics, and `spawn_reported` for supervised background
//! tasks whose failure nobody else observes. Both communicate with the
//! bridge task only through a channel; the panic hook itself never touches
//! async state.

use std::future::Future;
use std::panic::PanicHookInfo;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

/// Fallback message when a task failure carries no derivable message
pub const GENERIC_TASK_FAILURE: &str = "unhandled task failure";

/// One uncaught error observed by a feed
#[derive(Debug, Clone)]
pub struct RuntimeErrorReport {
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Install the process panic hook.
///
/// Installed once at startup, before any other work, so early panics are not
/// missed. The previous hook still runs, keeping the default backtrace
/// output intact.
pub fn install_panic_hook(tx: mpsc::UnboundedSender<RuntimeErrorReport>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = tx.send(report_from_panic(info));
        previous(info);
    }));
}

fn report_from_panic(info: &PanicHookInfo<'_>) -> RuntimeErrorReport {
    let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unhandled panic".to_string()
    };

    let (file, line) = match info.location() {
        Some(location) => (Some(location.file().to_string()), Some(location.line())),
        None => (None, None),
    };

    RuntimeErrorReport {
        message,
        file,
        line,
    }
}

/// Spawn a background task whose failure is reported instead of dropped.
///
/// The rejection analog: a task resolving to `Err` reports its error string
/// through the relay, falling back to a generic label when the error
/// renders empty.
pub fn spawn_reported<F>(
    label: &str,
    tx: mpsc::UnboundedSender<RuntimeErrorReport>,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let label = label.to_string();
    tokio::spawn(async move {
        if let Err(err) = future.await {
            error!("Task {} failed: {:#}", label, err);
            let mut message = err.to_string();
            if message.is_empty() {
                message = GENERIC_TASK_FAILURE.to_string();
            }
            let _ = tx.send(RuntimeErrorReport {
                message,
                file: None,
                line: None,
            });
        }
    })
}
