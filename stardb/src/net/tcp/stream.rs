use crate::reactor::poller::platform::{sys_close, sys_read, sys_write};

use std::io;
use std::os::fd::{AsRawFd, RawFd};

/// An accepted, non-blocking TCP connection.
///
/// The stream owns its descriptor and closes it on drop. Whoever
/// registered the descriptor with a poller must deregister it before
/// dropping the stream.
#[derive(Debug)]
pub struct TcpStream {
    fd: RawFd,
}

impl TcpStream {
    /// Takes ownership of a connected, non-blocking socket.
    pub(crate) fn from_raw(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Reads up to `buffer.len()` bytes.
    ///
    /// `Ok(0)` means the peer closed its write half.
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        sys_read(self.fd, buffer)
    }

    /// Writes as much of `buffer` as the socket accepts.
    pub fn write(&self, buffer: &[u8]) -> io::Result<usize> {
        sys_write(self.fd, buffer)
    }
}

impl AsRawFd for TcpStream {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for TcpStream {
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
