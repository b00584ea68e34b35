//! Platform-specific I/O poller abstraction.
//!
//! This module provides a unified interface over the kernel readiness
//! queues (epoll on Linux, kqueue on macOS and the BSDs). The concrete
//! implementation is selected at compile time; both expose
//! `new`, `register`, `reregister`, `deregister` and `poll` with the same
//! semantics.

pub(crate) mod common;

pub use common::Interest;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
mod kqueue;

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub type Poller = kqueue::KqueuePoller;

#[cfg(target_os = "linux")]
pub type Poller = epoll::EpollPoller;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(target_os = "linux")]
use std::time::Duration;

/// Converts a timeout into whole milliseconds for `epoll_wait`.
///
/// Rounds up so a sub-millisecond timeout never degrades into a
/// non-blocking poll.
#[cfg(target_os = "linux")]
pub(crate) fn timeout_millis(timeout: Duration) -> i32 {
    let ms = timeout.as_nanos().div_ceil(1_000_000);
    ms.min(i32::MAX as u128) as i32
}
