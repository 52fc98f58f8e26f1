//! HTML5 tokenizer public API.
//!
//! This is a streaming tokenizer: it consumes one [`InputChunk`] per call and
//! hands every token to a [`TokenSink`] synchronously. The tokenizer is an
//! explicit state machine and is resumable at any character boundary, so a
//! token may start in one chunk and finish in another.
//!
//! Invariants:
//! - Chunk-equivalence: feeding input in one chunk or many chunks yields the same
//!   token sequence, except that character runs may be split at chunk ends.
//!   Runs are also split before a `<` that turns out not to start markup.
//! - Yield points: the sink's `yield_requested` flag is polled before every
//!   step. A step emits at most one token (a character run is flushed on its
//!   own before the `<` that ends it), so a yield requested while a token is
//!   processed takes effect right after that token, with the chunk cursor
//!   just past its last character.
//! - Pending character data is flushed before any other token is emitted.

use crate::entities::{MAX_REFERENCE_LEN, is_reference_char, resolve_reference};
use crate::html5::shared::{DocumentParseContext, InputChunk, ParseErrorCode, Token};
use states::TokenizerState;

mod emit;
mod input;
mod states;
mod token_fmt;

pub use states::RawKind;
pub use token_fmt::TokenDisplay;

/// Configuration for the tokenizer.
#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Emit an `EOF` token from `eof()`.
    pub emit_eof: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { emit_eof: true }
    }
}

/// Result of one tokenization pass over a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenizeResult {
    /// The chunk is exhausted; more input is required to continue.
    NeedMoreInput,
    /// The sink asked the tokenizer to yield; the chunk cursor marks the
    /// resumption point.
    Suspended,
    /// EOF has been emitted and no further input will be consumed.
    EmittedEof,
}

/// Sink-side instruction returned for each processed token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSinkResult {
    Continue,
    /// Switch to a raw text content model for the start tag just processed.
    RawData(RawKind),
}

/// Consumer of tokens (normally the tree builder).
pub trait TokenSink {
    type Error;

    fn process_token(
        &mut self,
        token: Token,
        ctx: &mut DocumentParseContext,
    ) -> Result<TokenSinkResult, Self::Error>;

    /// Polled between state transitions; `true` makes the tokenizer return
    /// [`TokenizeResult::Suspended`].
    fn yield_requested(&self) -> bool {
        false
    }
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub state_transitions: u64,
    pub tokens_emitted: u64,
    pub chunks: u64,
    pub yields: u64,
}

/// Start or end tag under construction.
#[derive(Debug, Default)]
struct TagBuilder {
    name: String,
    is_end: bool,
    self_closing: bool,
    attrs: Vec<(String, Option<String>)>,
    attr_name: String,
    attr_value: Option<String>,
    attr_open: bool,
}

/// HTML5 tokenizer.
pub struct Html5Tokenizer {
    config: TokenizerConfig,
    state: TokenizerState,
    /// State to return to after a character reference.
    return_state: TokenizerState,
    /// Pending character run.
    text: String,
    /// Comment or doctype payload under construction.
    comment: String,
    /// Scratch: markup declaration prefix, reference body, raw end tag candidate.
    temp: String,
    tag: TagBuilder,
    raw_kind: RawKind,
    raw_end_tag: String,
    /// Bytes consumed across every chunk of the session.
    position: usize,
    eof_emitted: bool,
    stats: TokenizerStats,
}

impl Html5Tokenizer {
    pub fn new(config: TokenizerConfig, _ctx: &mut DocumentParseContext) -> Self {
        Self {
            config,
            state: TokenizerState::Data,
            return_state: TokenizerState::Data,
            text: String::new(),
            comment: String::new(),
            temp: String::new(),
            tag: TagBuilder::default(),
            raw_kind: RawKind::RawText,
            raw_end_tag: String::new(),
            position: 0,
            eof_emitted: false,
            stats: TokenizerStats::default(),
        }
    }

    /// Start in a raw text content model (fragment parsing inside `title`,
    /// `script`, `plaintext`, ...).
    pub fn set_initial_content_model(&mut self, kind: RawKind, context_name: &str) {
        self.enter_raw(kind, context_name.to_ascii_lowercase());
    }

    /// Return a copy of current instrumentation counters.
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.eof_emitted
    }

    /// Tokenize `chunk` until it is exhausted or the sink requests a yield.
    ///
    /// Characters are consumed strictly left to right; on `Suspended` the
    /// cursor is positioned immediately after the last token's final character.
    pub fn tokenize_chunk<S: TokenSink + ?Sized>(
        &mut self,
        chunk: &mut InputChunk,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<TokenizeResult, S::Error> {
        assert!(
            !self.eof_emitted,
            "Html5Tokenizer::tokenize_chunk called after eof(); this violates end-of-stream contract"
        );
        self.stats.chunks = self.stats.chunks.saturating_add(1);
        loop {
            if sink.yield_requested() {
                self.stats.yields = self.stats.yields.saturating_add(1);
                return Ok(TokenizeResult::Suspended);
            }
            if !chunk.has_more() {
                break;
            }
            self.stats.steps = self.stats.steps.saturating_add(1);
            self.step(chunk, ctx, sink)?;
        }
        // Character runs never straddle chunks: the next chunk may be injected
        // content with a different origin.
        self.flush_text(ctx, sink)?;
        if sink.yield_requested() {
            self.stats.yields = self.stats.yields.saturating_add(1);
            return Ok(TokenizeResult::Suspended);
        }
        Ok(TokenizeResult::NeedMoreInput)
    }

    /// Signal end of input: resolve any partial construct and emit EOF.
    pub fn eof<S: TokenSink + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<TokenizeResult, S::Error> {
        if self.eof_emitted {
            return Ok(TokenizeResult::EmittedEof);
        }
        if self.state == TokenizerState::CharacterReference {
            self.abandon_reference();
            let resume = self.return_state;
            self.transition_to(resume);
        }
        match self.state {
            TokenizerState::Data | TokenizerState::RawText | TokenizerState::Plaintext => {}
            TokenizerState::TagOpen | TokenizerState::RawTextLessThanSign => self.text.push('<'),
            TokenizerState::EndTagOpen | TokenizerState::RawTextEndTagOpen => {
                self.text.push_str("</")
            }
            TokenizerState::RawTextEndTagName => {
                self.text.push_str("</");
                let temp = std::mem::take(&mut self.temp);
                self.text.push_str(&temp);
            }
            TokenizerState::MarkupDeclarationOpen => {
                self.comment = std::mem::take(&mut self.temp);
                self.emit_comment(ctx, sink)?;
            }
            TokenizerState::CommentStart
            | TokenizerState::CommentStartDash
            | TokenizerState::Comment
            | TokenizerState::CommentEndDash
            | TokenizerState::CommentEnd
            | TokenizerState::BogusComment => {
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.position);
                self.emit_comment(ctx, sink)?;
            }
            TokenizerState::Doctype => {
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.position);
                self.emit_doctype(ctx, sink, true)?;
            }
            TokenizerState::TagName
            | TokenizerState::BeforeAttributeName
            | TokenizerState::AttributeName
            | TokenizerState::AfterAttributeName
            | TokenizerState::BeforeAttributeValue
            | TokenizerState::AttributeValueDoubleQuoted
            | TokenizerState::AttributeValueSingleQuoted
            | TokenizerState::AttributeValueUnquoted
            | TokenizerState::AfterAttributeValueQuoted
            | TokenizerState::SelfClosingStartTag => {
                // EOF in tag: the tag is dropped.
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.position);
                self.tag = TagBuilder::default();
            }
            TokenizerState::CharacterReference => {
                debug_assert!(false, "character reference resolved above");
            }
        }
        self.flush_text(ctx, sink)?;
        if self.config.emit_eof {
            self.emit_token(Token::Eof, ctx, sink)?;
        }
        self.eof_emitted = true;
        Ok(TokenizeResult::EmittedEof)
    }

    fn transition_to(&mut self, next: TokenizerState) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(
                target: "html5.tokenizer",
                "state {:?} -> {:?} @{}",
                self.state,
                next,
                self.position
            );
        }
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    /// Advance by one transition. The chunk is non-empty on entry.
    ///
    /// Arms that do not consume must change state or flush pending text, so
    /// every call makes progress within at most two steps.
    fn step<S: TokenSink + ?Sized>(
        &mut self,
        chunk: &mut InputChunk,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        let Some(ch) = chunk.peek() else {
            return Ok(());
        };
        match self.state {
            TokenizerState::Data => match ch {
                // The run ends here; emit it on its own so a yield it asks
                // for lands before the markup that follows.
                '<' if !self.text.is_empty() => self.flush_text(ctx, sink)?,
                '<' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::TagOpen);
                }
                '&' => {
                    self.consume(chunk);
                    self.begin_reference(TokenizerState::Data);
                }
                '\0' => {
                    self.consume(chunk);
                    ctx.record_error(ParseErrorCode::UnexpectedNullCharacter, self.position);
                    self.text.push('\u{FFFD}');
                }
                _ => self.consume_data_run(chunk),
            },
            TokenizerState::RawText => match ch {
                '<' if !self.text.is_empty() => self.flush_text(ctx, sink)?,
                '<' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::RawTextLessThanSign);
                }
                '&' if self.raw_kind == RawKind::RcData => {
                    self.consume(chunk);
                    self.begin_reference(TokenizerState::RawText);
                }
                _ => {
                    let rcdata = self.raw_kind == RawKind::RcData;
                    self.consume_text_run(chunk, |c| c == '<' || (rcdata && c == '&'));
                }
            },
            TokenizerState::RawTextLessThanSign => {
                if ch == '/' {
                    self.consume(chunk);
                    self.temp.clear();
                    self.transition_to(TokenizerState::RawTextEndTagOpen);
                } else {
                    self.text.push('<');
                    self.transition_to(TokenizerState::RawText);
                }
            }
            TokenizerState::RawTextEndTagOpen => {
                if ch.is_ascii_alphabetic() {
                    self.tag = TagBuilder {
                        is_end: true,
                        ..TagBuilder::default()
                    };
                    self.transition_to(TokenizerState::RawTextEndTagName);
                } else {
                    self.text.push_str("</");
                    self.transition_to(TokenizerState::RawText);
                }
            }
            TokenizerState::RawTextEndTagName => {
                if ch.is_ascii_alphabetic() {
                    self.consume(chunk);
                    self.tag.name.push(ch.to_ascii_lowercase());
                    self.temp.push(ch);
                    return Ok(());
                }
                let appropriate = self.tag.name == self.raw_end_tag;
                match ch {
                    c if appropriate && c.is_ascii_whitespace() => {
                        self.consume(chunk);
                        self.transition_to(TokenizerState::BeforeAttributeName);
                    }
                    '/' if appropriate => {
                        self.consume(chunk);
                        self.transition_to(TokenizerState::SelfClosingStartTag);
                    }
                    '>' if appropriate => {
                        self.consume(chunk);
                        self.emit_current_tag(ctx, sink)?;
                    }
                    _ => {
                        self.text.push_str("</");
                        let temp = std::mem::take(&mut self.temp);
                        self.text.push_str(&temp);
                        self.tag = TagBuilder::default();
                        self.transition_to(TokenizerState::RawText);
                    }
                }
            }
            TokenizerState::Plaintext => {
                self.consume_text_run(chunk, |_| false);
            }
            TokenizerState::TagOpen => match ch {
                '!' => {
                    self.consume(chunk);
                    self.temp.clear();
                    self.transition_to(TokenizerState::MarkupDeclarationOpen);
                }
                '/' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::EndTagOpen);
                }
                c if c.is_ascii_alphabetic() => {
                    self.tag = TagBuilder::default();
                    self.transition_to(TokenizerState::TagName);
                }
                '?' => {
                    ctx.record_error(ParseErrorCode::InvalidFirstCharacterOfTagName, self.position);
                    self.comment.clear();
                    self.transition_to(TokenizerState::BogusComment);
                }
                _ => {
                    ctx.record_error(ParseErrorCode::InvalidFirstCharacterOfTagName, self.position);
                    self.text.push('<');
                    self.transition_to(TokenizerState::Data);
                }
            },
            TokenizerState::EndTagOpen => match ch {
                c if c.is_ascii_alphabetic() => {
                    self.tag = TagBuilder {
                        is_end: true,
                        ..TagBuilder::default()
                    };
                    self.transition_to(TokenizerState::TagName);
                }
                '>' => {
                    self.consume(chunk);
                    ctx.record_error(ParseErrorCode::MissingEndTagName, self.position);
                    self.transition_to(TokenizerState::Data);
                }
                _ => {
                    ctx.record_error(ParseErrorCode::InvalidFirstCharacterOfTagName, self.position);
                    self.comment.clear();
                    self.transition_to(TokenizerState::BogusComment);
                }
            },
            TokenizerState::TagName => {
                self.consume(chunk);
                match ch {
                    c if c.is_ascii_whitespace() => {
                        self.transition_to(TokenizerState::BeforeAttributeName)
                    }
                    '/' => self.transition_to(TokenizerState::SelfClosingStartTag),
                    '>' => self.emit_current_tag(ctx, sink)?,
                    '\0' => self.tag.name.push('\u{FFFD}'),
                    c => self.tag.name.push(c.to_ascii_lowercase()),
                }
            }
            TokenizerState::BeforeAttributeName => match ch {
                c if c.is_ascii_whitespace() => {
                    self.consume(chunk);
                }
                '/' | '>' => self.transition_to(TokenizerState::AfterAttributeName),
                '=' => {
                    self.consume(chunk);
                    self.start_attribute();
                    self.tag.attr_name.push('=');
                    self.transition_to(TokenizerState::AttributeName);
                }
                _ => {
                    self.start_attribute();
                    self.transition_to(TokenizerState::AttributeName);
                }
            },
            TokenizerState::AttributeName => match ch {
                c if c.is_ascii_whitespace() || c == '/' || c == '>' => {
                    self.transition_to(TokenizerState::AfterAttributeName)
                }
                '=' => {
                    self.consume(chunk);
                    self.tag.attr_value = Some(String::new());
                    self.transition_to(TokenizerState::BeforeAttributeValue);
                }
                c => {
                    self.consume(chunk);
                    self.tag.attr_name.push(c.to_ascii_lowercase());
                }
            },
            TokenizerState::AfterAttributeName => {
                self.consume(chunk);
                match ch {
                    c if c.is_ascii_whitespace() => {}
                    '/' => self.transition_to(TokenizerState::SelfClosingStartTag),
                    '=' => {
                        self.tag.attr_value = Some(String::new());
                        self.transition_to(TokenizerState::BeforeAttributeValue);
                    }
                    '>' => self.emit_current_tag(ctx, sink)?,
                    c => {
                        self.start_attribute();
                        self.tag.attr_name.push(c.to_ascii_lowercase());
                        self.transition_to(TokenizerState::AttributeName);
                    }
                }
            }
            TokenizerState::BeforeAttributeValue => match ch {
                c if c.is_ascii_whitespace() => {
                    self.consume(chunk);
                }
                '"' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::AttributeValueDoubleQuoted);
                }
                '\'' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::AttributeValueSingleQuoted);
                }
                '>' => {
                    self.consume(chunk);
                    ctx.record_error(ParseErrorCode::Other, self.position);
                    self.emit_current_tag(ctx, sink)?;
                }
                _ => self.transition_to(TokenizerState::AttributeValueUnquoted),
            },
            TokenizerState::AttributeValueDoubleQuoted
            | TokenizerState::AttributeValueSingleQuoted => {
                let quote = if self.state == TokenizerState::AttributeValueDoubleQuoted {
                    '"'
                } else {
                    '\''
                };
                self.consume(chunk);
                match ch {
                    c if c == quote => {
                        self.transition_to(TokenizerState::AfterAttributeValueQuoted)
                    }
                    '&' => {
                        let resume = self.state;
                        self.begin_reference(resume);
                    }
                    c => self.push_attr_value(c),
                }
            }
            TokenizerState::AttributeValueUnquoted => {
                self.consume(chunk);
                match ch {
                    c if c.is_ascii_whitespace() => {
                        self.transition_to(TokenizerState::BeforeAttributeName)
                    }
                    '&' => self.begin_reference(TokenizerState::AttributeValueUnquoted),
                    '>' => self.emit_current_tag(ctx, sink)?,
                    c => self.push_attr_value(c),
                }
            }
            TokenizerState::AfterAttributeValueQuoted => match ch {
                c if c.is_ascii_whitespace() => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::BeforeAttributeName);
                }
                '/' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::SelfClosingStartTag);
                }
                '>' => {
                    self.consume(chunk);
                    self.emit_current_tag(ctx, sink)?;
                }
                _ => {
                    ctx.record_error(ParseErrorCode::Other, self.position);
                    self.transition_to(TokenizerState::BeforeAttributeName);
                }
            },
            TokenizerState::SelfClosingStartTag => {
                if ch == '>' {
                    self.consume(chunk);
                    self.tag.self_closing = true;
                    self.emit_current_tag(ctx, sink)?;
                } else {
                    ctx.record_error(ParseErrorCode::Other, self.position);
                    self.transition_to(TokenizerState::BeforeAttributeName);
                }
            }
            TokenizerState::MarkupDeclarationOpen => {
                self.consume(chunk);
                self.temp.push(ch);
                if self.temp == "--" {
                    self.temp.clear();
                    self.comment.clear();
                    self.transition_to(TokenizerState::CommentStart);
                } else if self.temp.eq_ignore_ascii_case("doctype") {
                    self.temp.clear();
                    self.comment.clear();
                    self.transition_to(TokenizerState::Doctype);
                } else if !is_declaration_prefix(&self.temp) {
                    ctx.record_error(ParseErrorCode::Other, self.position);
                    self.comment = std::mem::take(&mut self.temp);
                    if ch == '>' {
                        self.comment.pop();
                        self.emit_comment(ctx, sink)?;
                    } else {
                        self.transition_to(TokenizerState::BogusComment);
                    }
                }
            }
            TokenizerState::CommentStart => match ch {
                '-' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::CommentStartDash);
                }
                '>' => {
                    self.consume(chunk);
                    ctx.record_error(ParseErrorCode::Other, self.position);
                    self.emit_comment(ctx, sink)?;
                }
                _ => self.transition_to(TokenizerState::Comment),
            },
            TokenizerState::CommentStartDash => match ch {
                '-' => {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::CommentEnd);
                }
                '>' => {
                    self.consume(chunk);
                    ctx.record_error(ParseErrorCode::Other, self.position);
                    self.emit_comment(ctx, sink)?;
                }
                _ => {
                    self.comment.push('-');
                    self.transition_to(TokenizerState::Comment);
                }
            },
            TokenizerState::Comment => {
                if ch == '-' {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::CommentEndDash);
                } else {
                    self.consume_comment_run(chunk);
                }
            }
            TokenizerState::CommentEndDash => {
                if ch == '-' {
                    self.consume(chunk);
                    self.transition_to(TokenizerState::CommentEnd);
                } else {
                    self.comment.push('-');
                    self.transition_to(TokenizerState::Comment);
                }
            }
            TokenizerState::CommentEnd => match ch {
                '>' => {
                    self.consume(chunk);
                    self.emit_comment(ctx, sink)?;
                }
                '-' => {
                    self.consume(chunk);
                    self.comment.push('-');
                }
                _ => {
                    self.comment.push_str("--");
                    self.transition_to(TokenizerState::Comment);
                }
            },
            TokenizerState::BogusComment => {
                self.consume(chunk);
                match ch {
                    '>' => self.emit_comment(ctx, sink)?,
                    '\0' => self.comment.push('\u{FFFD}'),
                    c => self.comment.push(c),
                }
            }
            TokenizerState::Doctype => {
                self.consume(chunk);
                if ch == '>' {
                    self.emit_doctype(ctx, sink, false)?;
                } else {
                    self.comment.push(ch);
                }
            }
            TokenizerState::CharacterReference => {
                if ch == ';' {
                    self.consume(chunk);
                    let body = std::mem::take(&mut self.temp);
                    match resolve_reference(&body) {
                        Some(resolved) => self.push_reference_output(resolved),
                        None => {
                            ctx.record_error(
                                ParseErrorCode::InvalidCharacterReference,
                                self.position,
                            );
                            self.push_reference_literal("&");
                            self.push_reference_literal(&body);
                            self.push_reference_literal(";");
                        }
                    }
                    let resume = self.return_state;
                    self.transition_to(resume);
                } else if is_reference_char(ch) && self.temp.len() < MAX_REFERENCE_LEN {
                    self.consume(chunk);
                    self.temp.push(ch);
                } else {
                    self.abandon_reference();
                    let resume = self.return_state;
                    self.transition_to(resume);
                }
            }
        }
        Ok(())
    }

    fn begin_reference(&mut self, return_state: TokenizerState) {
        self.return_state = return_state;
        self.temp.clear();
        self.transition_to(TokenizerState::CharacterReference);
    }

    /// Emit `&` plus the buffered body unchanged (no terminating `;` seen).
    fn abandon_reference(&mut self) {
        let body = std::mem::take(&mut self.temp);
        self.push_reference_literal("&");
        self.push_reference_literal(&body);
    }

    fn push_reference_output(&mut self, ch: char) {
        if self.return_state.is_attribute_value() {
            self.push_attr_value(ch);
        } else {
            self.text.push(ch);
        }
    }

    fn push_reference_literal(&mut self, literal: &str) {
        if self.return_state.is_attribute_value() {
            self.tag
                .attr_value
                .get_or_insert_with(String::new)
                .push_str(literal);
        } else {
            self.text.push_str(literal);
        }
    }

    fn start_attribute(&mut self) {
        self.finish_attribute();
        self.tag.attr_open = true;
    }

    fn push_attr_value(&mut self, ch: char) {
        let ch = if ch == '\0' { '\u{FFFD}' } else { ch };
        self.tag.attr_value.get_or_insert_with(String::new).push(ch);
    }

    /// Commit the attribute under construction; duplicates are dropped (first wins).
    fn finish_attribute(&mut self) {
        if !std::mem::take(&mut self.tag.attr_open) {
            return;
        }
        let name = std::mem::take(&mut self.tag.attr_name);
        let value = self.tag.attr_value.take();
        if name.is_empty() || self.tag.attrs.iter().any(|(existing, _)| *existing == name) {
            return;
        }
        self.tag.attrs.push((name, value));
    }
}

fn is_declaration_prefix(candidate: &str) -> bool {
    "--".starts_with(candidate)
        || (candidate.len() <= 7 && "doctype".starts_with(&candidate.to_ascii_lowercase()))
}
