//! BSD/macOS `kqueue`-based poller implementation.
//!
//! Exposes the same interface as the Linux `epoll` backend. Read and write
//! readiness are separate kqueue filters; the write filter is kept
//! registered but disabled while a descriptor has nothing to flush.

use super::common::Interest;
use super::unix::{sys_close, sys_set_cloexec};
use crate::reactor::event::{Event, push_merged};

use libc::{
    EV_ADD, EV_DELETE, EV_DISABLE, EV_ENABLE, EV_EOF, EV_ERROR, EV_RECEIPT, EVFILT_READ,
    EVFILT_WRITE, kevent, kqueue, timespec,
};
use std::os::fd::RawFd;
use std::time::{Duration, Instant};
use std::{io, mem, ptr};

/// `kqueue` poller.
pub struct KqueuePoller {
    /// Kqueue file descriptor.
    kq: RawFd,

    /// Maximum number of events returned by one poll.
    max_events: usize,

    /// Reusable buffer for kernel events.
    events: Vec<kevent>,
}

// `kevent::udata` is a raw pointer; this poller never sets or reads it.
unsafe impl Send for KqueuePoller {}

fn change(fd: RawFd, filter: i16, flags: u16) -> kevent {
    let mut ev: kevent = unsafe { mem::zeroed() };
    ev.ident = fd as _;
    ev.filter = filter as _;
    ev.flags = (flags | EV_RECEIPT as u16) as _;
    ev
}

impl KqueuePoller {
    /// Create a new `KqueuePoller` returning at most `batch_size` events
    /// per poll.
    pub fn new(batch_size: usize) -> io::Result<Self> {
        let kq = unsafe { kqueue() };
        if kq < 0 {
            return Err(io::Error::last_os_error());
        }

        if let Err(e) = sys_set_cloexec(kq) {
            sys_close(kq);
            return Err(e);
        }

        Ok(Self {
            kq,
            max_events: batch_size.max(1),
            events: Vec::with_capacity(batch_size.max(1)),
        })
    }

    /// Register a file descriptor with the poller.
    pub fn register(&self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.reregister(fd, interest)
    }

    /// Update interest flags for an already registered descriptor.
    ///
    /// `EV_ADD` is idempotent, so this doubles as the registration path.
    pub fn reregister(&self, fd: RawFd, interest: Interest) -> io::Result<()> {
        let read = if interest.read { EV_ENABLE } else { EV_DISABLE };
        let write = if interest.write { EV_ENABLE } else { EV_DISABLE };

        self.apply(
            &[
                change(fd, EVFILT_READ as i16, (EV_ADD | read) as u16),
                change(fd, EVFILT_WRITE as i16, (EV_ADD | write) as u16),
            ],
            false,
        )
    }

    /// Remove a file descriptor from the poller.
    ///
    /// Must be called before `fd` is closed.
    pub fn deregister(&self, fd: RawFd) -> io::Result<()> {
        self.apply(
            &[
                change(fd, EVFILT_READ as i16, EV_DELETE as u16),
                change(fd, EVFILT_WRITE as i16, EV_DELETE as u16),
            ],
            true,
        )
    }

    /// Submits `changes` and checks each per-change receipt.
    fn apply(&self, changes: &[kevent], ignore_missing: bool) -> io::Result<()> {
        let mut receipts: Vec<kevent> = Vec::with_capacity(changes.len());

        let n = unsafe {
            kevent(
                self.kq,
                changes.as_ptr(),
                changes.len() as _,
                receipts.as_mut_ptr(),
                changes.len() as _,
                ptr::null(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        unsafe {
            receipts.set_len(n as usize);
        }

        for receipt in &receipts {
            if receipt.flags as u16 & EV_ERROR as u16 == 0 || receipt.data == 0 {
                continue;
            }

            let errno = receipt.data as i32;
            if ignore_missing && errno == libc::ENOENT {
                continue;
            }
            return Err(io::Error::from_raw_os_error(errno));
        }

        Ok(())
    }

    /// Poll for I/O readiness events.
    ///
    /// Same contract as the epoll backend: clears `events`, blocks until
    /// something is ready or the timeout expires, and resumes waits
    /// interrupted by signals.
    pub fn poll(&mut self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);

        events.clear();
        self.events.clear();

        let n = loop {
            let remaining = deadline.map(|d| {
                let left = d.saturating_duration_since(Instant::now());
                timespec {
                    tv_sec: left.as_secs() as _,
                    tv_nsec: left.subsec_nanos() as _,
                }
            });
            let timeout_ptr = remaining
                .as_ref()
                .map_or(ptr::null(), |ts| ts as *const timespec);

            let n = unsafe {
                kevent(
                    self.kq,
                    ptr::null(),
                    0,
                    self.events.as_mut_ptr(),
                    self.max_events as _,
                    timeout_ptr,
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
            let fd = ev.ident as RawFd;
            let filter = ev.filter as i16;
            let flags = ev.flags as u16;

            let failed = flags & (EV_EOF as u16 | EV_ERROR as u16) != 0;

            push_merged(
                events,
                Event {
                    fd,
                    readable: filter == EVFILT_READ as i16 || failed,
                    writable: filter == EVFILT_WRITE as i16,
                },
            );
        }

        Ok(())
    }
}

impl Drop for KqueuePoller {
    fn drop(&mut self) {
        sys_close(self.kq);
    }
}
