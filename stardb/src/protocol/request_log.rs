use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Append-only record of every processed read.
///
/// Each read produces a start banner, one entry per classified line and a
/// completion banner:
///
/// ```text
/// Reading 6 bytes for the connection: 127.0.0.1:53012
/// PING
/// Completed reading 6 bytes for the connection: 127.0.0.1:53012
/// ```
///
/// Failing to open or write the file never interrupts request handling;
/// failures are reported through `tracing` instead.
pub struct RequestLog {
    sink: Option<Sink>,
}

struct Sink {
    path: PathBuf,
    file: File,

    /// Set after a failed write so a broken sink warns once, not per line.
    failing: bool,
}

impl RequestLog {
    /// Opens (or creates) the log at `path` in append mode.
    ///
    /// An unopenable path yields a disabled log.
    pub fn open(path: &Path) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                debug!(path = %path.display(), "request log opened");
                Self {
                    sink: Some(Sink {
                        path: path.to_path_buf(),
                        file,
                        failing: false,
                    }),
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "request log unavailable, continuing without it");
                Self::disabled()
            }
        }
    }

    /// A log that discards everything.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Returns `true` if entries reach a file.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Records the start of a read of `bytes` bytes from `peer`.
    pub fn begin(&mut self, bytes: usize, peer: SocketAddr) {
        self.append(format!("Reading {bytes} bytes for the connection: {peer}\n").as_bytes());
    }

    /// Records one classified line.
    pub fn line(&mut self, line: &[u8]) {
        self.append(line);
        if !line.ends_with(b"\n") {
            self.append(b"\n");
        }
    }

    /// Records the end of a read started with [`begin`](Self::begin).
    pub fn complete(&mut self, bytes: usize, peer: SocketAddr) {
        self.append(
            format!("Completed reading {bytes} bytes for the connection: {peer}\n").as_bytes(),
        );
    }

    fn append(&mut self, bytes: &[u8]) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        match sink.file.write_all(bytes) {
            Ok(()) => sink.failing = false,
            Err(error) => {
                if !sink.failing {
                    warn!(path = %sink.path.display(), %error, "request log write failed");
                }
                sink.failing = true;
            }
        }
    }
}
