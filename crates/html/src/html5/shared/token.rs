//! HTML5 token model.

use super::AtomId;

/// HTML attribute with interned name and optional value.
///
/// Determinism contract:
/// - Attributes on a `StartTag` are stored in encounter order.
/// - Duplicate attributes in a single start tag are dropped after the first
///   occurrence (HTML tokenizer "first-wins" behavior).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: AtomId,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype {
        /// Name atomized with HTML ASCII-folding rules.
        name: Option<AtomId>,
        public_id: Option<String>,
        system_id: Option<String>,
        force_quirks: bool,
    },
    StartTag {
        name: AtomId,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: AtomId,
    },
    Comment {
        text: String,
    },
    /// Character run.
    ///
    /// Payloads are owned: a run never borrows from an input chunk because the
    /// chunk may be popped before the tree builder commits the text. Adjacent
    /// runs are not merged here; that is the coalescer's job.
    Text {
        text: String,
    },
    Eof,
}
