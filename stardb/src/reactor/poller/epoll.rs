//! Linux `epoll`-based poller implementation.
//!
//! Responsibilities:
//! - Register file descriptors with read/write interests
//! - Block waiting for I/O readiness, bounded by a timeout
//! - Retry waits interrupted by signals
//!
//! Watches are level-triggered: a descriptor with unread data keeps being
//! reported on every poll until it is drained.
//!
//! This backend is selected automatically on Linux targets.

use super::common::Interest;
use super::timeout_millis;
use super::unix::sys_close;
use crate::reactor::event::{Event, push_merged};

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLERR, EPOLLHUP, EPOLLIN,
    EPOLLOUT, epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

/// Linux `epoll` poller.
///
/// Owns the epoll instance and a reusable event buffer whose capacity is
/// the maximum batch size of a single [`poll`](Self::poll).
pub struct EpollPoller {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Maximum number of events returned by one poll.
    max_events: usize,

    /// Reusable buffer for kernel events.
    events: Vec<epoll_event>,
}

impl EpollPoller {
    /// Create a new `EpollPoller` returning at most `batch_size` events
    /// per poll.
    pub fn new(batch_size: usize) -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            epoll,
            max_events: batch_size.max(1),
            events: Vec::with_capacity(batch_size.max(1)),
        })
    }

    /// Register a file descriptor with the poller.
    pub fn register(&self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_ADD, fd, interest)
    }

    /// Update interest flags for an already registered descriptor.
    pub fn reregister(&self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_MOD, fd, interest)
    }

    /// Remove a file descriptor from the poller.
    ///
    /// Must be called before `fd` is closed.
    pub fn deregister(&self, fd: RawFd) -> io::Result<()> {
        // Kernels before 2.6.9 reject a null event even for DEL.
        let mut event = epoll_event { events: 0, u64: 0 };

        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, &mut event) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn ctl(&self, op: i32, fd: RawFd, interest: Interest) -> io::Result<()> {
        let mut flags = 0;

        if interest.read {
            flags |= EPOLLIN;
        }
        if interest.write {
            flags |= EPOLLOUT;
        }

        let mut event = epoll_event {
            events: flags as u32,
            u64: fd as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, op, fd, &mut event) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Poll for I/O readiness events.
    ///
    /// Clears `events`, then blocks until:
    /// - at least one file descriptor becomes ready,
    /// - or the timeout expires (leaving `events` empty).
    ///
    /// `None` waits indefinitely. A wait interrupted by a signal is
    /// resumed with whatever is left of the original timeout.
    pub fn poll(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);

        events.clear();
        self.events.clear();

        let n = loop {
            let timeout_ms = match deadline {
                Some(deadline) => timeout_millis(deadline.saturating_duration_since(Instant::now())),
                None => -1,
            };

            let n = unsafe {
                epoll_wait(
                    self.epoll,
                    self.events.as_mut_ptr(),
                    self.max_events as i32,
                    timeout_ms,
                )
            };

            if n >= 0 {
                break n as usize;
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        };

        unsafe {
            self.events.set_len(n);
        }

        for ev in &self.events {
            let flags = ev.events;
            let fd = ev.u64 as RawFd;

            push_merged(
                events,
                Event {
                    fd,
                    readable: flags & ((EPOLLIN | EPOLLERR | EPOLLHUP) as u32) != 0,
                    writable: flags & (EPOLLOUT as u32) != 0,
                },
            );
        }

        Ok(())
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        sys_close(self.epoll);
    }
}
