//! Readiness multiplexing.
//!
//! This module wraps the kernel readiness queue behind [`Poller`] and
//! defines the [`Event`] records it produces. The server's event loop is
//! the only consumer: it registers the listener and every accepted
//! connection here and dispatches on the events returned by
//! [`Poller::poll`].

pub(crate) mod event;
pub(crate) mod poller;

pub use event::Event;
pub use poller::{Interest, Poller};
