//! Request processing for a readable connection.
//!
//! One readiness notification triggers exactly one read. Complete lines
//! are classified and answered in arrival order; an unterminated tail is
//! left in the connection's buffer for the next notification. Since the
//! poller is level-triggered, data left in the socket after this read is
//! reported again on the next poll.

use super::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::{ERR_RESPONSE, Frame, RequestLog, classify};

use std::io;

use tracing::{debug, trace};

/// What the event loop should do with the connection after processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep the connection registered.
    Open,

    /// The peer closed its side; tear the connection down.
    Closed,
}

/// Reads once from `connection`, answers every complete line and queues
/// the responses for writing.
///
/// Responses are flushed before returning; whatever the socket does not
/// accept stays queued on the connection. On end of stream the queue gets
/// one last flush attempt before the connection is reported closed.
pub fn process(connection: &mut Connection, log: &mut RequestLog) -> Result<Outcome> {
    let peer = connection.peer;

    let read = connection.stream.read(connection.inbound.spare());
    let n = match read {
        Ok(0) => {
            if !connection.inbound.is_empty() {
                trace!(%peer, dropped = connection.inbound.pending(), "eof with unterminated line");
            }

            // A half-closed peer can still read; hand it what is queued.
            if connection.has_pending_output() {
                if let Err(error) = connection.flush() {
                    debug!(%peer, %error, "final flush failed");
                }
            }
            return Ok(Outcome::Closed);
        }
        Ok(n) => n,
        Err(e)
            if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted =>
        {
            return Ok(Outcome::Open);
        }
        Err(source) => return Err(Error::Read { peer, source }),
    };

    connection.inbound.fill(n);
    log.begin(n, peer);

    let mut lines = 0usize;
    while let Some(line) = connection.inbound.next_line() {
        let frame = classify(line);
        connection.outbound.extend_from_slice(frame.response());
        log.line(line);
        lines += 1;

        if frame == Frame::Malformed {
            trace!(%peer, "line without CRLF");
        }
    }

    // A full buffer with no line feed can never complete a line. It gets a
    // single rejection; the rest of it is dropped as it arrives.
    if connection.inbound.is_full() {
        let fragment = connection.inbound.take_fragment();
        trace!(%peer, len = fragment.len(), "line exceeds buffer, rejected");
        log.line(fragment);
        connection.outbound.extend_from_slice(ERR_RESPONSE);
        lines += 1;
    }

    log.complete(n, peer);
    trace!(%peer, bytes = n, lines, pending = connection.inbound.pending(), "read processed");

    connection
        .flush()
        .map_err(|source| Error::Write { peer, source })?;

    Ok(Outcome::Open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::TcpStream;
    use crate::protocol::OK_RESPONSE;

    use std::io::{Read, Write};
    use std::net::Shutdown;
    use std::os::fd::IntoRawFd;
    use std::os::unix::net::UnixStream;

    fn connection_pair(buffer_size: usize) -> (Connection, UnixStream) {
        let (local, remote) = UnixStream::pair().expect("Failed to create socket pair");
        local
            .set_nonblocking(true)
            .expect("Failed to set nonblocking");

        let stream = TcpStream::from_raw(local.into_raw_fd());
        let peer = "127.0.0.1:9".parse().expect("valid address");
        (Connection::new(stream, peer, buffer_size), remote)
    }

    #[test]
    fn oversized_line_gets_a_single_rejection() {
        let (mut connection, mut remote) = connection_pair(16);
        let mut log = RequestLog::disabled();

        let mut request = vec![b'a'; 40];
        request.extend_from_slice(b"\r\nPING\r\n");
        remote.write_all(&request).expect("Failed to write");

        // 48 bytes through a 16-byte buffer, plus one read that finds nothing.
        for _ in 0..4 {
            let outcome = process(&mut connection, &mut log).expect("process failed");
            assert_eq!(outcome, Outcome::Open);
        }
        assert!(connection.inbound.is_empty());
        assert!(!connection.inbound.is_discarding());

        remote
            .set_nonblocking(true)
            .expect("Failed to set nonblocking");
        let mut response = Vec::new();
        let _ = remote.read_to_end(&mut response);
        assert_eq!(response, [ERR_RESPONSE, OK_RESPONSE].concat());
    }

    #[test]
    fn queued_responses_are_flushed_when_the_peer_half_closes() {
        let (mut connection, mut remote) = connection_pair(64);
        connection.outbound.extend_from_slice(OK_RESPONSE);

        remote
            .shutdown(Shutdown::Write)
            .expect("Failed to shut down");

        let outcome =
            process(&mut connection, &mut RequestLog::disabled()).expect("process failed");
        assert_eq!(outcome, Outcome::Closed);
        assert!(!connection.has_pending_output());

        let mut response = [0u8; 5];
        remote.read_exact(&mut response).expect("Failed to read");
        assert_eq!(&response, OK_RESPONSE);
    }
}
