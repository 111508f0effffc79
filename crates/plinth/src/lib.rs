//! Plinth - Embeddable App-Shell Starter
//!
//! A minimal development shell meant to run under a supervising host:
//! - Router shell with two placeholder pages
//! - Runtime notifier reporting mount lifecycle to the embedding host
//! - Development error bridge relaying compile, checker, and runtime errors
//!   observed on the live-reload channel
//! - File watcher feeding the live-reload channel

// Re-export the wire types
pub use plinth_types;

// Development error bridge
pub mod bridge;

// Clock abstraction
pub mod clock;

// Configuration
pub mod config;

// Runtime notifier
pub mod notifier;

// HTTP server shell
pub mod server;

// Live-reload file watcher
pub mod watch;
