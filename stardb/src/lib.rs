//! # star-db
//!
//! A single-threaded, readiness-driven TCP server.
//!
//! One thread multiplexes every client connection over the kernel's
//! readiness queue (epoll on Linux, kqueue on macOS and the BSDs). Clients
//! send CR LF terminated lines; each line is acknowledged with `+OK\r\n`,
//! or with a fixed `-ERR` response when its terminator is wrong. No
//! command is interpreted: the server validates framing only.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stardb::{Config, Server};
//!
//! fn main() -> stardb::Result<()> {
//!     let config = Config::builder().port(8080).build();
//!     let mut server = Server::bind(config)?;
//!     server.run()
//! }
//! ```
//!
//! ## Modules
//!
//! - [`reactor`] — Readiness multiplexing over epoll/kqueue
//! - [`net`] — Non-blocking TCP listener and stream
//! - [`protocol`] — Line framing, fixed responses and the request log
//! - [`server`] — Connection registry, request processor and event loop

#[cfg(not(unix))]
compile_error!("stardb requires a Unix readiness queue (epoll or kqueue)");

pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod reactor;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use server::Server;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
