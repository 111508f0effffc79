//! HTTP Server Shell
//!
//! The router, placeholder pages, live-reload channel, and the server-layer
//! middleware (host allow-list, asset monitoring via the notifier).

mod allow;
mod assets;
mod hmr;
mod pages;
mod router;
mod state;

pub use allow::*;
pub use assets::*;
pub use hmr::*;
pub use pages::*;
pub use router::*;
pub use state::*;
