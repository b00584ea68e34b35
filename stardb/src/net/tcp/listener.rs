use super::stream::TcpStream;
use crate::reactor::poller::platform::{
    sys_accept, sys_bind, sys_close, sys_ipv6_dual_stack, sys_listen, sys_parse_sockaddr,
    sys_set_reuseaddr, sys_socket, sys_sockname,
};

use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

/// A non-blocking TCP listener.
///
/// `TcpListener` owns the passive socket. Its descriptor is meant to be
/// registered with a [`Poller`](crate::reactor::Poller) for read
/// readiness; a readable listener has at least one completed handshake
/// waiting in its backlog.
#[derive(Debug)]
pub struct TcpListener {
    /// File descriptor of the listening socket.
    fd: RawFd,
}

impl TcpListener {
    /// Binds a TCP listener to the given address.
    ///
    /// The address must be a valid socket address string, such as
    /// `"0.0.0.0:8080"` or `"[::1]:8080"`.
    ///
    /// This function:
    /// - creates a non-blocking socket,
    /// - enables `SO_REUSEADDR`,
    /// - configures IPv6 dual-stack if applicable,
    /// - binds and starts listening.
    pub fn bind(address: &str) -> io::Result<Self> {
        let (storage, len) = sys_parse_sockaddr(address)?;
        let domain = storage.ss_family as i32;

        // Owned from here on so every early return closes the socket.
        let listener = Self {
            fd: sys_socket(domain)?,
        };

        sys_set_reuseaddr(listener.fd)?;
        sys_ipv6_dual_stack(listener.fd, domain)?;
        sys_bind(listener.fd, &storage, len)?;
        sys_listen(listener.fd)?;

        Ok(listener)
    }

    /// Binds on all IPv4 interfaces at `port`.
    pub fn open(port: u16) -> io::Result<Self> {
        Self::bind(&format!("0.0.0.0:{port}"))
    }

    /// Accepts one pending connection.
    ///
    /// Returns `WouldBlock` when the backlog is empty, which happens
    /// when a readiness notification was spurious or another accept
    /// already drained it.
    pub fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (fd, address) = sys_accept(self.fd)?;

        Ok((TcpStream::from_raw(fd), address))
    }

    /// Returns the local socket address of this listener.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_sockname(self.fd)
    }
}

impl AsRawFd for TcpListener {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for TcpListener {
    /// Closes the listening socket.
    fn drop(&mut self) {
        sys_close(self.fd);
    }
}
