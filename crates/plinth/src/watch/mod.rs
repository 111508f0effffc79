//! Shell File Watcher
//!
//! Watches the app root and publishes update frames on the live-reload
//! channel when files change.

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use plinth_types::Frame;

use crate::server::LiveReloadHub;

/// App-root file watcher
pub struct ShellWatcher {
    /// Live-reload hub updates are published to
    hub: LiveReloadHub,
    /// Channel receiver for change batches
    rx: mpsc::Receiver<Vec<String>>,
    /// The underlying watcher (kept alive)
    _watcher: RecommendedWatcher,
}

impl ShellWatcher {
    /// Create a new watcher over the app root
    pub fn new(root: impl AsRef<Path>, hub: LiveReloadHub) -> Result<Self, notify::Error> {
        // Canonicalize for reliable prefix stripping
        let root = root
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| root.as_ref().to_path_buf());
        let (tx, rx) = mpsc::channel(100);

        let root_clone = root.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let paths = Self::event_paths(&root_clone, &event);
                    if !paths.is_empty() {
                        let _ = tx.blocking_send(paths);
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("Watching app root: {}", root.display());

        Ok(Self {
            hub,
            rx,
            _watcher: watcher,
        })
    }

    /// Extract the root-relative changed paths worth reporting
    fn event_paths(root: &Path, event: &Event) -> Vec<String> {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {}
            _ => return Vec::new(),
        }

        event
            .paths
            .iter()
            .filter_map(|path| {
                let rel = path.strip_prefix(root).ok()?;
                let rel = rel.to_string_lossy().to_string();
                if Self::is_noise(&rel) {
                    None
                } else {
                    Some(rel)
                }
            })
            .collect()
    }

    /// Editor droppings and hidden files do not trigger reloads
    fn is_noise(rel: &str) -> bool {
        rel.is_empty()
            || rel.split('/').any(|segment| segment.starts_with('.'))
            || rel.ends_with('~')
            || rel.ends_with(".swp")
            || rel.ends_with(".tmp")
    }

    /// Run the watcher loop
    pub async fn run(mut self) {
        info!("Starting file watcher loop");

        while let Some(paths) = self.rx.recv().await {
            debug!("Source change: {:?}", paths);
            self.hub.publish(&Frame::update(paths));
        }

        info!("File watcher loop ended");
    }
}
