use super::connection::Connection;

use std::collections::HashMap;
use std::os::fd::RawFd;

/// Maps an active descriptor to its connection.
///
/// The registry is the sole owner of every accepted connection: an entry
/// is inserted once at accept and removed once at close. Dropping an entry
/// closes its socket, so the descriptor must be deregistered from the
/// poller first.
#[derive(Default)]
pub struct Registry {
    connections: HashMap<RawFd, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly accepted connection.
    ///
    /// Returns the previous entry for `fd`, which only exists if a close
    /// path skipped [`remove`](Self::remove).
    pub(crate) fn insert(&mut self, fd: RawFd, connection: Connection) -> Option<Connection> {
        self.connections.insert(fd, connection)
    }

    pub fn get(&self, fd: RawFd) -> Option<&Connection> {
        self.connections.get(&fd)
    }

    pub(crate) fn get_mut(&mut self, fd: RawFd) -> Option<&mut Connection> {
        self.connections.get_mut(&fd)
    }

    pub(crate) fn remove(&mut self, fd: RawFd) -> Option<Connection> {
        self.connections.remove(&fd)
    }

    pub fn contains(&self, fd: RawFd) -> bool {
        self.connections.contains_key(&fd)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Descriptors of every registered connection, in no particular order.
    pub fn fds(&self) -> Vec<RawFd> {
        self.connections.keys().copied().collect()
    }
}
