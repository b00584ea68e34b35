//! TCP networking primitives.
//!
//! Non-blocking listener and stream types built directly on the platform
//! socket calls. Neither type blocks: operations that cannot complete
//! return `io::ErrorKind::WouldBlock`, and callers learn when to retry
//! from the [`Poller`](crate::reactor::Poller).
mod tcp;

pub use tcp::listener::TcpListener;
pub use tcp::stream::TcpStream;
