//! TCP networking implementation.
//!
//! It is split into:
//! - [`listener`]: the passive socket accepting incoming connections,
//! - [`stream`]: an accepted, non-blocking connection.

pub mod listener;
pub mod stream;
