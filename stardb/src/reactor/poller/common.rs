/// Readiness conditions a descriptor is watched for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest {
    pub read: bool,
    pub write: bool,
}

impl Interest {
    /// Watch for incoming data only.
    pub const READABLE: Interest = Interest {
        read: true,
        write: false,
    };

    /// Watch for incoming data and for room in the send buffer.
    pub const READ_WRITE: Interest = Interest {
        read: true,
        write: true,
    };
}
