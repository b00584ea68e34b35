use std::os::fd::RawFd;

/// An I/O event reported by the poller.
///
/// An `Event` is readiness information for one registered descriptor,
/// valid only for the poll call that produced it. Readiness means the
/// next operation will not block, not that any particular number of
/// bytes is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// Descriptor the event refers to.
    pub fd: RawFd,

    /// The descriptor is readable, has hung up, or has a pending error.
    pub readable: bool,

    /// The descriptor is writable.
    pub writable: bool,
}

/// Merges `event` into `events`, folding duplicate reports for one
/// descriptor into a single entry.
///
/// kqueue reports read and write filters as separate records; epoll
/// never produces duplicates, so this is a no-op there.
pub(crate) fn push_merged(events: &mut Vec<Event>, event: Event) {
    if let Some(e) = events.iter_mut().find(|e| e.fd == event.fd) {
        e.readable |= event.readable;
        e.writable |= event.writable;
    } else {
        events.push(event);
    }
}
