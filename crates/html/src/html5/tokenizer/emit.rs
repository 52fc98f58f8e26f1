//! Token emission helpers.

use crate::html5::shared::{Attribute, DocumentParseContext, Token};
use crate::html5::tokenizer::states::{RawKind, TokenizerState};
use crate::html5::tokenizer::{Html5Tokenizer, TokenSink, TokenSinkResult};

impl Html5Tokenizer {
    pub(super) fn emit_token<S: TokenSink + ?Sized>(
        &mut self,
        token: Token,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<TokenSinkResult, S::Error> {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html5.tokenizer", "emit token: {token:?}");
        self.stats.tokens_emitted = self.stats.tokens_emitted.saturating_add(1);
        ctx.counters.tokens_emitted = ctx.counters.tokens_emitted.saturating_add(1);
        ctx.token_end = self.position;
        sink.process_token(token, ctx)
    }

    /// Emit the pending character run, if any.
    pub(super) fn flush_text<S: TokenSink + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        if self.text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.text);
        self.emit_token(Token::Text { text }, ctx, sink)?;
        Ok(())
    }

    pub(super) fn emit_comment<S: TokenSink + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        self.flush_text(ctx, sink)?;
        let text = std::mem::take(&mut self.comment);
        self.emit_token(Token::Comment { text }, ctx, sink)?;
        self.transition_to(TokenizerState::Data);
        Ok(())
    }

    pub(super) fn emit_doctype<S: TokenSink + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
        eof: bool,
    ) -> Result<(), S::Error> {
        self.flush_text(ctx, sink)?;
        let raw = std::mem::take(&mut self.comment);
        let parsed = parse_doctype(&raw);
        let name = parsed.name.map(|name| ctx.atoms.intern_ascii_folded(name));
        let token = Token::Doctype {
            name,
            public_id: parsed.public_id,
            system_id: parsed.system_id,
            force_quirks: eof || name.is_none(),
        };
        self.emit_token(token, ctx, sink)?;
        self.transition_to(TokenizerState::Data);
        Ok(())
    }

    /// Emit the tag under construction and pick the follow-up state.
    ///
    /// Start tags may switch the tokenizer into a raw text content model when
    /// the sink asks for it; everything else returns to `Data`.
    pub(super) fn emit_current_tag<S: TokenSink + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        self.finish_attribute();
        self.flush_text(ctx, sink)?;
        let tag = std::mem::take(&mut self.tag);
        let name = ctx.atoms.intern_ascii_folded(&tag.name);
        if tag.is_end {
            self.emit_token(Token::EndTag { name }, ctx, sink)?;
            self.transition_to(TokenizerState::Data);
            return Ok(());
        }
        let attrs = tag
            .attrs
            .into_iter()
            .map(|(attr, value)| Attribute {
                name: ctx.atoms.intern_ascii_folded(&attr),
                value,
            })
            .collect();
        let token = Token::StartTag {
            name,
            attrs,
            self_closing: tag.self_closing,
        };
        match self.emit_token(token, ctx, sink)? {
            TokenSinkResult::Continue => self.transition_to(TokenizerState::Data),
            TokenSinkResult::RawData(kind) => self.enter_raw(kind, tag.name),
        }
        Ok(())
    }

    pub(super) fn enter_raw(&mut self, kind: RawKind, end_tag_name: String) {
        self.raw_kind = kind;
        self.raw_end_tag = end_tag_name;
        let next = if kind == RawKind::Plaintext {
            TokenizerState::Plaintext
        } else {
            TokenizerState::RawText
        };
        self.transition_to(next);
    }
}

struct ParsedDoctype<'a> {
    name: Option<&'a str>,
    public_id: Option<String>,
    system_id: Option<String>,
}

/// Split the raw doctype payload (`html PUBLIC "..." "..."`) into its parts.
fn parse_doctype(raw: &str) -> ParsedDoctype<'_> {
    let raw = raw.trim_start();
    let name_end = raw
        .find(|ch: char| ch.is_ascii_whitespace())
        .unwrap_or(raw.len());
    let name = (name_end > 0).then(|| &raw[..name_end]);
    let mut rest = raw[name_end..].trim_start();
    let mut public_id = None;
    let mut system_id = None;
    if rest.len() >= 6 && rest[..6].eq_ignore_ascii_case("public") {
        rest = &rest[6..];
        public_id = take_quoted(&mut rest);
        system_id = take_quoted(&mut rest);
    } else if rest.len() >= 6 && rest[..6].eq_ignore_ascii_case("system") {
        rest = &rest[6..];
        system_id = take_quoted(&mut rest);
    }
    ParsedDoctype {
        name,
        public_id,
        system_id,
    }
}

fn take_quoted(rest: &mut &str) -> Option<String> {
    let trimmed = rest.trim_start();
    let quote = trimmed.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
    let body = &trimmed[1..];
    let end = body.find(quote).unwrap_or(body.len());
    let value = body[..end].to_string();
    *rest = body.get(end + 1..).unwrap_or("");
    Some(value)
}
