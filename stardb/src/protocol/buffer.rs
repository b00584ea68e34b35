/// A fixed-capacity inbound buffer that carries partial lines across reads.
///
/// Bytes are read into [`spare`](Self::spare) and committed with
/// [`fill`](Self::fill). Complete lines are then taken off the front with
/// [`next_line`](Self::next_line), which only moves the `start` cursor.
/// A trailing fragment without a line feed stays buffered until a later
/// read completes it.
///
/// The storage is allocated once. Consumed bytes are reclaimed by
/// shifting the live region to the front when more room is needed.
///
/// Layout:
///
/// ```text
/// 0        start      scan        end          capacity
/// |consumed|  pending  |  unscanned |   spare    |
/// ```
///
/// `scan` marks how far the pending region is known to contain no line
/// feed, so a fragment is not searched again on every read.
///
/// A line that outgrows the buffer is cut off with
/// [`take_fragment`](Self::take_fragment). The rest of that line, up to and
/// including its line feed, is then dropped as it arrives instead of being
/// framed as new lines.
pub struct LineBuffer {
    data: Box<[u8]>,
    start: usize,
    scan: usize,
    end: usize,

    /// Set while the tail of an oversized line is being skipped.
    discarding: bool,
}

impl LineBuffer {
    /// Creates a buffer holding at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            scan: 0,
            end: 0,
            discarding: false,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn pending(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` when no byte is buffered.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` when the buffer holds `capacity` bytes without a
    /// single line feed among them.
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end == self.data.len()
    }

    /// Returns `true` while the tail of an oversized line is being dropped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Free space to read into, compacting first if the front is consumed.
    pub fn spare(&mut self) -> &mut [u8] {
        if self.start > 0 {
            self.data.copy_within(self.start..self.end, 0);
            self.scan -= self.start;
            self.end -= self.start;
            self.start = 0;
        }

        &mut self.data[self.end..]
    }

    /// Commits `n` bytes written into the slice returned by
    /// [`spare`](Self::spare).
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the spare capacity.
    pub fn fill(&mut self, n: usize) {
        assert!(self.end + n <= self.data.len(), "fill past capacity");
        self.end += n;
    }

    /// Takes the next complete line, line feed included.
    ///
    /// Bytes belonging to a line already cut off by
    /// [`take_fragment`](Self::take_fragment) are skipped first.
    pub fn next_line(&mut self) -> Option<&[u8]> {
        if self.discarding && !self.skip_discarded() {
            return None;
        }

        let from = self.scan.max(self.start);
        let newline = self.data[from..self.end].iter().position(|&b| b == b'\n');

        match newline {
            Some(offset) => {
                let line_start = self.start;
                let line_end = from + offset + 1;

                self.start = line_end;
                self.scan = line_end;

                Some(&self.data[line_start..line_end])
            }
            None => {
                self.scan = self.end;
                self.reset_if_drained();
                None
            }
        }
    }

    /// Takes every buffered byte as one fragment, regardless of line feeds.
    ///
    /// Used to cut off a line that outgrew the buffer. The remainder of that
    /// line is skipped by later calls to [`next_line`](Self::next_line).
    pub fn take_fragment(&mut self) -> &[u8] {
        let (start, end) = (self.start, self.end);

        self.start = 0;
        self.scan = 0;
        self.end = 0;
        self.discarding = true;

        &self.data[start..end]
    }

    /// Drops bytes up to and including the next line feed.
    ///
    /// Returns `true` once the oversized line has ended.
    fn skip_discarded(&mut self) -> bool {
        let from = self.scan.max(self.start);

        match self.data[from..self.end].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                self.start = from + offset + 1;
                self.scan = self.start;
                self.discarding = false;
                true
            }
            None => {
                self.start = 0;
                self.scan = 0;
                self.end = 0;
                false
            }
        }
    }

    fn reset_if_drained(&mut self) {
        if self.start == self.end {
            self.start = 0;
            self.scan = 0;
            self.end = 0;
        }
    }
}
