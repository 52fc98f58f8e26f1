//! Tokenizer state machine definitions.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenizerState {
    Data,
    /// Raw text family (RAWTEXT, RCDATA, script data); see [`RawKind`].
    RawText,
    RawTextLessThanSign,
    RawTextEndTagOpen,
    RawTextEndTagName,
    Plaintext,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    BogusComment,
    Doctype,
    CharacterReference,
}

impl TokenizerState {
    pub(crate) fn is_attribute_value(self) -> bool {
        matches!(
            self,
            TokenizerState::AttributeValueDoubleQuoted
                | TokenizerState::AttributeValueSingleQuoted
                | TokenizerState::AttributeValueUnquoted
        )
    }
}

/// Content model the tree builder can switch the tokenizer into after a start tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawKind {
    /// `style`, `xmp`, `iframe`, `noembed`, `noframes`, scripted `noscript`.
    RawText,
    /// `title`, `textarea`: character references are decoded.
    RcData,
    /// `script`.
    ScriptData,
    /// `plaintext`: no end tag is ever recognized.
    Plaintext,
}
