use crate::net::TcpStream;
use crate::protocol::LineBuffer;

use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

/// Per-connection state owned by the [`Registry`](super::Registry).
///
/// Besides the socket, a connection carries:
/// - an inbound [`LineBuffer`] holding any partial line between reads,
/// - an outbound queue of acknowledgments the socket has not accepted yet.
pub struct Connection {
    pub(crate) stream: TcpStream,
    pub(crate) peer: SocketAddr,
    pub(crate) inbound: LineBuffer,
    pub(crate) outbound: Vec<u8>,

    /// Whether the poller currently watches this descriptor for writability.
    pub(crate) write_interest: bool,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, buffer_size: usize) -> Self {
        Self {
            stream,
            peer,
            inbound: LineBuffer::with_capacity(buffer_size),
            outbound: Vec::new(),
            write_interest: false,
        }
    }

    /// Remote endpoint of the connection.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Bytes received but not yet terminated by a line feed.
    pub fn pending_input(&self) -> usize {
        self.inbound.pending()
    }

    /// Returns `true` while responses are waiting for socket buffer space.
    pub fn has_pending_output(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Writes queued responses until the queue is empty or the socket
    /// would block.
    pub(crate) fn flush(&mut self) -> io::Result<()> {
        let mut written = 0;

        while written < self.outbound.len() {
            match self.stream.write(&self.outbound[written..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "write returned zero bytes",
                    ));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.outbound.drain(..written);
        Ok(())
    }
}

impl AsRawFd for Connection {
    fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}
