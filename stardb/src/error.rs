//! Error types for the server.
//!
//! Failures are split by blast radius: setup failures stop the process,
//! everything else is scoped to a single connection and handled by the
//! event loop.

use std::io;
use std::net::SocketAddr;
use std::os::fd::RawFd;

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding the listener or creating the readiness queue failed.
    #[error("setup failed ({context}): {source}")]
    Setup {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// Waiting on the readiness queue failed for a reason other than a
    /// signal interruption.
    #[error("poll failed: {0}")]
    Poll(#[source] io::Error),

    /// A pending connection could not be accepted.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// Adding or modifying a readiness watch for a connection failed.
    #[error("registration of fd {fd} failed: {source}")]
    Registration {
        fd: RawFd,
        #[source]
        source: io::Error,
    },

    /// Reading from a connection failed.
    #[error("read from {peer} failed: {source}")]
    Read {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Writing to a connection failed.
    #[error("write to {peer} failed: {source}")]
    Write {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Wraps an I/O error raised while bringing the server up.
    pub fn setup(context: &'static str, source: io::Error) -> Self {
        Error::Setup { context, source }
    }

    /// Returns `true` if the error must terminate the process.
    ///
    /// Only setup-class failures are fatal: setup and configuration errors,
    /// plus a poll failure, which means the readiness queue created at
    /// startup is broken. Per-connection failures (accept, registration,
    /// read, write) are recoverable: the loop drops the offending connection
    /// and keeps going.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Setup { .. } | Error::Poll(_) | Error::Config(_))
    }
}
