//! Input chunks fed to the HTML5 tokenizer.

use memchr::{memchr, memchr3};
use std::sync::atomic::{AtomicU64, Ordering};

/// One contiguous run of decoded input plus a consumption cursor.
///
/// Invariants:
/// - the text is immutable once the chunk exists;
/// - `cursor <= text.len()` and `cursor` always sits on a UTF-8 boundary;
/// - a chunk may only be discarded once `cursor == text.len()`.
#[derive(Debug)]
pub struct InputChunk {
    id: u64,
    text: Box<str>,
    cursor: usize,
}

impl InputChunk {
    pub fn new(text: impl Into<Box<str>>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            text: text.into(),
            cursor: 0,
        }
    }

    /// Opaque identity for this chunk instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Bytes consumed so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.text.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.text.len()
    }

    /// Text not yet consumed by the tokenizer.
    pub fn remaining(&self) -> &str {
        &self.text[self.cursor..]
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume one character and return it.
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.cursor += ch.len_utf8();
        Some(ch)
    }

    /// Consume the longest prefix whose characters satisfy `pred`, returning it.
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &str {
        let start = self.cursor;
        let rest = &self.text[start..];
        let len = rest
            .char_indices()
            .find(|&(_, ch)| !pred(ch))
            .map_or(rest.len(), |(idx, _)| idx);
        self.cursor += len;
        &self.text[start..start + len]
    }

    /// Consume up to (not including) the first occurrence of any of three
    /// ASCII delimiter bytes, or to the end of the chunk.
    pub fn take_until3(&mut self, a: u8, b: u8, c: u8) -> &str {
        debug_assert!(a.is_ascii() && b.is_ascii() && c.is_ascii());
        let start = self.cursor;
        let rest = &self.text.as_bytes()[start..];
        let len = memchr3(a, b, c, rest).unwrap_or(rest.len());
        self.cursor += len;
        &self.text[start..start + len]
    }

    /// Consume up to (not including) the first occurrence of an ASCII byte.
    pub fn take_until(&mut self, delimiter: u8) -> &str {
        debug_assert!(delimiter.is_ascii());
        let start = self.cursor;
        let rest = &self.text.as_bytes()[start..];
        let len = memchr(delimiter, rest).unwrap_or(rest.len());
        self.cursor += len;
        &self.text[start..start + len]
    }
}

#[cfg(test)]
mod tests {
    use super::InputChunk;

    #[test]
    fn cursor_advances_by_utf8_width() {
        let mut chunk = InputChunk::new("aé<");
        assert_eq!(chunk.next_char(), Some('a'));
        assert_eq!(chunk.next_char(), Some('é'));
        assert_eq!(chunk.cursor(), 3);
        assert_eq!(chunk.remaining(), "<");
        assert!(chunk.has_more());
        assert_eq!(chunk.next_char(), Some('<'));
        assert!(chunk.is_exhausted());
        assert_eq!(chunk.next_char(), None);
    }

    #[test]
    fn take_while_stops_at_delimiter() {
        let mut chunk = InputChunk::new("hello<b>");
        assert_eq!(chunk.take_while(|ch| ch != '<'), "hello");
        assert_eq!(chunk.peek(), Some('<'));
        assert_eq!(chunk.take_while(|ch| ch != '<'), "");
    }

    #[test]
    fn take_until_scans_past_multibyte_text() {
        let mut chunk = InputChunk::new("héllo&amp;<b>");
        assert_eq!(chunk.take_until3(b'<', b'&', 0), "héllo");
        assert_eq!(chunk.peek(), Some('&'));
        assert_eq!(chunk.take_until(b'>'), "&amp;<b");
        assert_eq!(chunk.take_until(b'>'), "");
        assert_eq!(chunk.next_char(), Some('>'));
        assert_eq!(chunk.take_until(b'x'), "");
        assert!(chunk.is_exhausted());
    }

    #[test]
    fn chunk_ids_are_unique() {
        let a = InputChunk::new("a");
        let b = InputChunk::new("a");
        assert_ne!(a.id(), b.id());
    }
}
