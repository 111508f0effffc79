//! Plinth Shell
//!
//! Embeddable app-shell starter with live reload and host notifications.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use plinth::bridge::{install_panic_hook, spawn_reported, DevBridge};
use plinth::clock::{Clock, SystemClock};
use plinth::config::AppConfig;
use plinth::notifier::{ParentFrame, RuntimeNotifier};
use plinth::server::{create_router, AppState, LiveReloadHub};
use plinth::watch::ShellWatcher;
use plinth_types::{ERROR_RENDER_FAILURE, ERROR_ROOT_NOT_FOUND};

/// Plinth Development Shell
#[derive(Parser, Debug)]
#[command(name = "plinth")]
#[command(about = "Plinth Development Shell", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "plinth.toml")]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured app root directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Don't start the file watcher
    #[arg(long)]
    no_watch: bool,
}

fn main() -> Result<()> {
    // Build and run tokio runtime
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("plinth=info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let args = Args::parse();

    info!("Starting Plinth shell v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(root) = args.root {
        config.app_root = root;
    }

    // Detect the embedding host
    let parent = ParentFrame::from_env();
    if parent.is_attached() {
        info!("Embedded under a supervising host, notifications enabled");
    }

    // Runtime error feed; the panic hook goes in before anything else runs
    // so early panics are not missed
    let (err_tx, err_rx) = mpsc::unbounded_channel();
    install_panic_hook(err_tx.clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Idle gate for the deferred ready notification
    let (idle_tx, idle_rx) = watch::channel(false);
    let notifier = RuntimeNotifier::new(
        parent.clone(),
        clock.clone(),
        Duration::from_millis(config.idle_timeout_ms),
        idle_rx,
    );

    // The app root is the mount point; without it there is nothing to serve
    if !config.app_root.is_dir() {
        error!("App root not found: {}", config.app_root.display());
        notifier.notify_error(ERROR_ROOT_NOT_FOUND, None);
        std::process::exit(1);
    }

    // Assemble the shell
    let hub = LiveReloadHub::new();
    let state = AppState::new(config.clone(), hub.clone(), notifier.clone());
    let app = create_router(state);

    // Error bridge observes the live-reload channel and the error feed
    let bridge = DevBridge::new(
        parent.clone(),
        clock.clone(),
        Duration::from_millis(config.dedup_window_ms),
    );
    tokio::spawn(bridge.run(hub.subscribe(), err_rx));

    // File watcher feeds the live-reload channel
    if args.no_watch || !config.watch {
        info!("File watcher disabled");
    } else {
        match ShellWatcher::new(&config.app_root, hub.clone()) {
            Ok(watcher) => {
                spawn_reported("file-watcher", err_tx.clone(), async move {
                    watcher.run().await;
                    Ok(())
                });
                info!("File watcher started");
            }
            Err(e) => {
                error!("Failed to start file watcher: {}", e);
            }
        }
    }

    // Mount: bind the listener
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            let message = e.to_string();
            notifier.notify_error(ERROR_RENDER_FAILURE, Some(message.as_str()));
            std::process::exit(1);
        }
    };

    info!("Shell listening on http://{}", addr);
    info!("Live-reload endpoint: ws://{}/hmr", addr);

    // Startup work has drained; open the idle gate and announce the mount
    let _ = idle_tx.send(true);
    notifier.notify_ready();

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shell shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
