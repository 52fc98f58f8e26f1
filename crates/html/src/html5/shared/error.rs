//! Parse errors for tokenization/tree-building.
//!
//! These are recoverable HTML errors: they are recorded in the document
//! context and never abort parsing.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    UnexpectedNullCharacter,
    UnexpectedEof,
    InvalidCharacterReference,
    InvalidFirstCharacterOfTagName,
    MissingEndTagName,
    UnexpectedEndTag,
    MisplacedDoctype,
    FosterParentedContent,
    Other,
}

/// A recoverable parse error.
///
/// `position` is the number of bytes consumed by the tokenizer across all chunks of
/// the session (injected content included), not offsets into the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub position: usize,
}
