//! Pending input storage for the pump loop.

use crate::html5::shared::InputChunk;

/// LIFO stack of input chunks. The top chunk is the one being tokenized.
///
/// Injected content is pushed above the active chunk and is therefore fully
/// consumed before the remainder of the chunk underneath it.
#[derive(Debug, Default)]
pub(crate) struct BufferStack {
    chunks: Vec<InputChunk>,
    max_depth: usize,
}

impl BufferStack {
    pub(crate) fn push(&mut self, chunk: InputChunk) {
        self.chunks.push(chunk);
        self.max_depth = self.max_depth.max(self.chunks.len());
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut InputChunk> {
        self.chunks.last_mut()
    }

    /// Pop the active chunk; it must have been fully consumed.
    pub(crate) fn pop_exhausted(&mut self) -> Option<InputChunk> {
        let top = self.chunks.last()?;
        debug_assert!(top.is_exhausted(), "popping a chunk with unconsumed input");
        if !top.is_exhausted() {
            return None;
        }
        self.chunks.pop()
    }

    pub(crate) fn depth(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Unconsumed text across all chunks, top first.
    pub(crate) fn remaining_len(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.remaining().len()).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.chunks.clear();
    }
}

/// Host writes waiting to become a chunk.
///
/// Text is only materialized at the start of a pump iteration, never while
/// a token is being built.
#[derive(Debug, Default)]
pub(crate) struct PendingWriteBuffer {
    text: String,
}

impl PendingWriteBuffer {
    pub(crate) fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.text.len()
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }

    /// Turn the accumulated text into a chunk, leaving the buffer empty.
    pub(crate) fn materialize(&mut self) -> Option<InputChunk> {
        if self.text.is_empty() {
            return None;
        }
        Some(InputChunk::new(std::mem::take(&mut self.text)))
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferStack, PendingWriteBuffer};
    use crate::html5::shared::InputChunk;

    #[test]
    fn injected_chunk_is_consumed_before_the_rest_of_the_active_one() {
        let mut stack = BufferStack::default();
        stack.push(InputChunk::new("abcd"));
        let top = stack.top_mut().expect("chunk");
        assert_eq!(top.next_char(), Some('a'));

        stack.push(InputChunk::new("XY"));
        let mut seen = String::new();
        while let Some(top) = stack.top_mut() {
            while let Some(ch) = top.next_char() {
                seen.push(ch);
            }
            stack.pop_exhausted();
        }
        assert_eq!(seen, "XYbcd");
        assert_eq!(stack.max_depth(), 2);
    }

    #[test]
    fn remaining_len_counts_every_chunk() {
        let mut stack = BufferStack::default();
        stack.push(InputChunk::new("abc"));
        stack.push(InputChunk::new("de"));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.remaining_len(), 5);
        stack.clear();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn pending_writes_accumulate_then_materialize_once() {
        let mut pending = PendingWriteBuffer::default();
        assert!(pending.materialize().is_none());
        pending.append("<b>");
        pending.append("x");
        assert_eq!(pending.len(), 4);
        let chunk = pending.materialize().expect("chunk");
        assert_eq!(chunk.as_str(), "<b>x");
        assert!(pending.is_empty());
        assert!(pending.materialize().is_none());
    }
}
