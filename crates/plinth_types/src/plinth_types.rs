//! Plinth Types - Wire types shared between the app shell and its host
//!
//! This crate contains the pure data structures for the two channels the
//! shell speaks on:
//!
//! - the notification protocol posted to the embedding host (parent frame)
//! - the live-reload frame protocol observed by the development error bridge

mod diagnostic;
mod frame;
mod notification;

pub use diagnostic::*;
pub use frame::*;
pub use notification::*;
