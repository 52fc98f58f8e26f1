//! Tokenizer input helpers.

use crate::html5::shared::InputChunk;
use crate::html5::tokenizer::Html5Tokenizer;

impl Html5Tokenizer {
    /// Consume the current character, keeping the session position in sync.
    pub(super) fn consume(&mut self, chunk: &mut InputChunk) -> Option<char> {
        let ch = chunk.next_char()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Bulk-consume a run of characters into the pending text buffer.
    pub(super) fn consume_text_run(
        &mut self,
        chunk: &mut InputChunk,
        stop: impl FnMut(char) -> bool,
    ) -> usize {
        let mut stop = stop;
        let run = chunk.take_while(|ch| !stop(ch));
        self.position += run.len();
        self.text.push_str(run);
        run.len()
    }

    /// Data state fast path: consume text up to the next `<`, `&` or NUL.
    pub(super) fn consume_data_run(&mut self, chunk: &mut InputChunk) {
        let run = chunk.take_until3(b'<', b'&', 0);
        self.position += run.len();
        self.text.push_str(run);
    }

    /// Append comment text up to the next `-`.
    pub(super) fn consume_comment_run(&mut self, chunk: &mut InputChunk) {
        let run = chunk.take_until(b'-');
        self.position += run.len();
        self.comment.push_str(run);
    }
}
