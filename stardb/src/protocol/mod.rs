//! Line protocol.
//!
//! Requests are arbitrary text lines terminated by CR LF. No command is
//! interpreted: each line is only checked for its terminator and answered
//! with one of two fixed acknowledgments.
//!
//! ```text
//! client                      server
//!   PING\r\n        ───────▶
//!                   ◀───────  +OK\r\n
//!   PING\n          ───────▶
//!                   ◀───────  -ERR invalid request format. Request does not end in CRLF.\r\n
//! ```

mod buffer;
mod frame;
mod request_log;

pub use buffer::LineBuffer;
pub use frame::{ERR_RESPONSE, Frame, OK_RESPONSE, classify};
pub use request_log::RequestLog;
