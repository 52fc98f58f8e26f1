//! Document-level parse context (shared resources).

use super::{AtomTable, Counters, ParseError, ParseErrorCode};

/// Document-level parse context shared by tokenizer and tree builder.
///
/// Owns document-lifetime resources such as atom tables and metrics. Parse
/// errors are recorded here and never surfaced to the driver's caller.
#[derive(Debug, Default)]
pub struct DocumentParseContext {
    pub atoms: AtomTable,
    pub counters: Counters,
    pub errors: Vec<ParseError>,
    /// Byte offset just past the token currently being processed.
    pub token_end: usize,
}

impl DocumentParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&mut self, code: ParseErrorCode, position: usize) {
        self.counters.parse_errors = self.counters.parse_errors.saturating_add(1);
        self.errors.push(ParseError { code, position });
    }

    /// Record an error against the token currently being processed.
    pub fn record_tree_error(&mut self, code: ParseErrorCode) {
        self.record_error(code, self.token_end);
    }
}
