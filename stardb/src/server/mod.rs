//! The event loop and the per-connection machinery it drives.
//!
//! ```text
//! Poller ──batch──▶ Server::dispatch
//!                     ├─ listener fd ──▶ accept ──▶ Poller::register + Registry::insert
//!                     └─ other fd ─────▶ Registry lookup ──▶ processor::process
//!                                           (absent: event dropped)
//! ```
//!
//! Everything runs on the thread that calls [`Server::run`].

mod connection;
mod event_loop;
mod processor;
mod registry;

pub use connection::Connection;
pub use event_loop::{LoopState, LoopStats, Server};
pub use processor::{Outcome, process};
pub use registry::Registry;
