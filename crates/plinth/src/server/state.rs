//! Server Application State
//!
//! Shared state accessible by all handlers and middleware.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::notifier::RuntimeNotifier;

use super::hmr::LiveReloadHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    hub: LiveReloadHub,
    notifier: RuntimeNotifier,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, hub: LiveReloadHub, notifier: RuntimeNotifier) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                hub,
                notifier,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn hub(&self) -> &LiveReloadHub {
        &self.inner.hub
    }

    pub fn notifier(&self) -> &RuntimeNotifier {
        &self.inner.notifier
    }
}
