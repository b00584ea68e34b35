//! Server configuration.
//!
//! Centralized configuration with defaults matching the reference
//! deployment: all interfaces on port 8080, a request log next to the
//! working directory.

use crate::error::{Error, Result};

use std::path::PathBuf;
use std::time::Duration;

/// Default TCP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default upper bound on a single poll call.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Default maximum number of events returned by one poll call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default capacity of each connection's inbound buffer, in bytes.
pub const DEFAULT_READ_BUFFER: usize = 2048;

/// Default request log location.
pub const DEFAULT_LOG_PATH: &str = "star-db.log";

/// Main configuration for a server instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP listen address (`host:port`).
    pub listen_addr: String,

    /// How long a poll call may block before returning an empty batch.
    ///
    /// Must be non-zero so an idle server does not spin.
    pub poll_timeout: Duration,

    /// Maximum number of readiness events drained per poll call.
    pub batch_size: usize,

    /// Capacity of each connection's line buffer. A line longer than this
    /// is answered as malformed.
    pub read_buffer_size: usize,

    /// Append-only request log. `None` disables request logging.
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            batch_size: DEFAULT_BATCH_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER,
            log_path: Some(PathBuf::from(DEFAULT_LOG_PATH)),
        }
    }
}

impl Config {
    /// Create a new config builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Checks the invariants the event loop relies on.
    pub fn validate(&self) -> Result<()> {
        if self.poll_timeout.is_zero() {
            return Err(Error::Config("poll_timeout must be non-zero".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be > 0".into()));
        }
        // Shortest well-formed line is a bare CRLF.
        if self.read_buffer_size < 2 {
            return Err(Error::Config("read_buffer_size must be >= 2".into()));
        }
        Ok(())
    }
}

/// Builder for [`Config`].
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Listen on all interfaces at `port`.
    pub fn port(mut self, port: u16) -> Self {
        self.config.listen_addr = format!("0.0.0.0:{port}");
        self
    }

    /// Set the poll timeout.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = timeout;
        self
    }

    /// Set the maximum number of events per poll call.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the per-connection buffer capacity (in bytes).
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the request log path.
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = Some(path.into());
        self
    }

    /// Disable the request log.
    pub fn without_log(mut self) -> Self {
        self.config.log_path = None;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
