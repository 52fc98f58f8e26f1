//! Character run coalescing.
//!
//! Adjacent character tokens are gathered into one buffer and handed to the
//! tree as a single append. The buffer only exists for the duration of a
//! coalescing session (one parse session).

/// Initial buffer capacity for a coalescing session.
pub const DEFAULT_COALESCER_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
pub(crate) struct CharacterCoalescer {
    /// `None` outside a coalescing session.
    buf: Option<String>,
    capacity: usize,
}

impl CharacterCoalescer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity,
        }
    }

    pub(crate) fn start(&mut self) {
        debug_assert!(self.buf.is_none(), "coalescing session already started");
        self.buf = Some(String::with_capacity(self.capacity));
    }

    /// Release the buffer. Pending characters must have been flushed.
    pub(crate) fn end(&mut self) {
        debug_assert!(
            self.buf.as_ref().is_none_or(String::is_empty),
            "coalescing session ended with pending characters"
        );
        self.buf = None;
    }

    /// Append characters to the pending run.
    ///
    /// Returns `false` when no coalescing session is active.
    #[must_use]
    pub(crate) fn accumulate(&mut self, text: &str) -> bool {
        let Some(buf) = self.buf.as_mut() else {
            return false;
        };
        // Grow to exactly the required size once the initial capacity is used up.
        let needed = buf.len() + text.len();
        if needed > buf.capacity() {
            buf.reserve_exact(needed - buf.len());
        }
        buf.push_str(text);
        true
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.buf.as_ref().map_or(0, String::len)
    }

    /// Take the pending run, leaving an empty buffer with the same capacity.
    ///
    /// Returns `None` when nothing is pending, so an empty run is never flushed.
    pub(crate) fn take_pending(&mut self) -> Option<String> {
        let buf = self.buf.as_mut()?;
        if buf.is_empty() {
            return None;
        }
        let text = buf.clone();
        buf.clear();
        Some(text)
    }
}
