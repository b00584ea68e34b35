/// Acknowledgment for a line terminated by CR LF.
pub const OK_RESPONSE: &[u8] = b"+OK\r\n";

/// Negative acknowledgment for a line missing its CR.
pub const ERR_RESPONSE: &[u8] = b"-ERR invalid request format. Request does not end in CRLF.\r\n";

/// Classification of one inbound line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    /// The line ends in CR LF.
    WellFormed,

    /// Anything else, including a line cut short by the buffer limit.
    Malformed,
}

impl Frame {
    /// The fixed response sent back for this classification.
    pub fn response(self) -> &'static [u8] {
        match self {
            Frame::WellFormed => OK_RESPONSE,
            Frame::Malformed => ERR_RESPONSE,
        }
    }
}

/// Classifies a candidate line, terminator included.
pub fn classify(line: &[u8]) -> Frame {
    if line.ends_with(b"\r\n") {
        Frame::WellFormed
    } else {
        Frame::Malformed
    }
}
