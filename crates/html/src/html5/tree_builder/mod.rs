//! HTML5 tree builder public API.
//!
//! Consumes HTML5 tokens and mutates an arena [`Dom`] directly. The builder
//! owns all tree-construction state (insertion modes, stack of open elements,
//! pending character run) and is resumable across token boundaries, so a
//! parse can be suspended between any two tokens.
//!
//! Core v0 scope: implied `html`/`head`/`body`, void elements, `p`/`li`/`dd`/
//! `dt` auto-closing, implied end tags, scope-checked end tags, SVG/MathML
//! namespaces, foster parenting out of tables, raw text elements and fragment
//! parsing. No adoption agency, templates, select or frameset handling.

use crate::dom::{Dom, ElementData, Namespace, NodeKey};
use crate::html5::shared::{AtomId, Attribute, DocumentParseContext, ParseErrorCode, Token};
use crate::html5::tokenizer::{RawKind, TokenDisplay, TokenSinkResult};
use std::sync::Arc;

mod coalescer;
mod emit;
mod factory;
mod listener;
mod modes;
mod sink;
mod stack;
mod tags;

pub use coalescer::DEFAULT_COALESCER_CAPACITY;
pub use factory::{ElementFactory, FactoryError};
pub use listener::{ListenerContext, ListenerError, NoopListener, ParseListener};
pub use sink::{TreeHost, TreeSink};

use coalescer::CharacterCoalescer;
use modes::InsertionMode;
use stack::{OpenElement, OpenElementsStack, ScopeKind};
use tags::KnownTags;

#[derive(Clone, Debug)]
pub struct TreeBuilderConfig {
    /// Coalesce adjacent character tokens into one append per run.
    pub coalesce_text: bool,
    /// Initial capacity of the coalescing buffer.
    pub coalescer_capacity: usize,
    /// Treat `<noscript>` content as raw text.
    pub scripting_enabled: bool,
}

impl Default for TreeBuilderConfig {
    fn default() -> Self {
        Self {
            coalesce_text: true,
            coalescer_capacity: DEFAULT_COALESCER_CAPACITY,
            scripting_enabled: true,
        }
    }
}

/// Fatal tree construction failure.
#[derive(Debug)]
pub enum TreeBuilderError {
    /// A listener hook failed.
    Listener(ListenerError),
    /// Engine invariant violation (bug/corruption), not a recoverable HTML error.
    Invariant(&'static str),
}

impl std::fmt::Display for TreeBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeBuilderError::Listener(err) => err.fmt(f),
            TreeBuilderError::Invariant(what) => write!(f, "tree builder invariant violated: {what}"),
        }
    }
}

impl std::error::Error for TreeBuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeBuilderError::Listener(err) => Some(err),
            TreeBuilderError::Invariant(_) => None,
        }
    }
}

impl From<ListenerError> for TreeBuilderError {
    fn from(err: ListenerError) -> Self {
        TreeBuilderError::Listener(err)
    }
}

/// Where the parsed nodes end up.
#[derive(Clone, Debug)]
pub enum BuildTarget {
    /// Build a full document under `Dom::document()`.
    Document,
    /// Parse as if inside an element named `context_name`, then move the
    /// resulting nodes into `into`.
    Fragment {
        context_ns: Namespace,
        context_name: Arc<str>,
        into: NodeKey,
    },
}

#[derive(Clone, Copy, Debug)]
struct FragmentState {
    root: NodeKey,
    context_ns: Namespace,
    context_name: AtomId,
    into: NodeKey,
}

/// HTML5 tree builder.
pub struct Html5TreeBuilder {
    config: TreeBuilderConfig,
    atoms_id: u64,
    tags: KnownTags,
    mode: InsertionMode,
    original_mode: InsertionMode,
    open: OpenElementsStack,
    coalescer: CharacterCoalescer,
    /// Parent for nodes inserted before any element is open.
    root: NodeKey,
    head: Option<NodeKey>,
    fragment: Option<FragmentState>,
    initial_content_model: Option<RawKind>,
    finished: bool,
}

impl Html5TreeBuilder {
    /// Create a builder and open its coalescing session.
    pub fn new(
        config: TreeBuilderConfig,
        ctx: &mut DocumentParseContext,
        dom: &mut Dom,
        target: BuildTarget,
    ) -> Self {
        let tags = KnownTags::intern(&mut ctx.atoms);
        let mut coalescer = CharacterCoalescer::new(config.coalescer_capacity);
        coalescer.start();
        let mut builder = Self {
            atoms_id: ctx.atoms.id(),
            tags,
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            open: OpenElementsStack::default(),
            coalescer,
            root: dom.document(),
            head: None,
            fragment: None,
            initial_content_model: None,
            finished: false,
            config,
        };
        if let BuildTarget::Fragment {
            context_ns,
            context_name,
            into,
        } = target
        {
            let root = dom.create_element(ElementData::new(
                Namespace::Html,
                Arc::from("html"),
                Vec::new(),
            ));
            builder
                .open
                .push(OpenElement::new(root, tags.html, Namespace::Html));
            let context_name_atom = ctx.atoms.intern_ascii_folded(&context_name);
            let html_context = context_ns == Namespace::Html;
            builder.mode = if html_context && context_name_atom == tags.html {
                InsertionMode::BeforeHead
            } else {
                InsertionMode::InBody
            };
            if html_context {
                builder.initial_content_model = tags::raw_content_model(
                    &context_name.to_ascii_lowercase(),
                    builder.config.scripting_enabled,
                );
            }
            builder.root = root;
            builder.fragment = Some(FragmentState {
                root,
                context_ns,
                context_name: context_name_atom,
                into,
            });
        }
        builder
    }

    /// Content model the tokenizer must start in (fragment contexts such as
    /// `textarea` or `script`).
    pub fn initial_content_model(&self) -> Option<RawKind> {
        self.initial_content_model
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn open_element_count(&self) -> usize {
        self.open.len()
    }

    pub fn max_open_depth(&self) -> u32 {
        self.open.max_depth()
    }

    /// Bytes of character data waiting in the coalescer.
    pub fn pending_text_len(&self) -> usize {
        self.coalescer.pending_len()
    }

    /// Process one token. Tokens are consumed in order; the return value tells
    /// the tokenizer whether to switch content model.
    pub fn process_token<L: ParseListener + ?Sized>(
        &mut self,
        token: Token,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<TokenSinkResult, TreeBuilderError> {
        debug_assert_eq!(
            self.atoms_id,
            ctx.atoms.id(),
            "tree builder used with a different atom table"
        );
        if self.finished {
            return Err(TreeBuilderError::Invariant("token after end of document"));
        }
        if log::log_enabled!(target: "html5.tree_builder", log::Level::Trace) {
            log::trace!(
                target: "html5.tree_builder",
                "{:?}: {}",
                self.mode,
                TokenDisplay::new(&token, &ctx.atoms)
            );
        }
        match token {
            Token::Text { text } => {
                self.process_text(&text, ctx, host)?;
                Ok(TokenSinkResult::Continue)
            }
            Token::Comment { text } => {
                self.insert_comment(text, ctx, host)?;
                Ok(TokenSinkResult::Continue)
            }
            Token::Doctype {
                name,
                public_id,
                system_id,
                ..
            } => {
                self.flush_characters(ctx, host)?;
                if self.mode == InsertionMode::Initial {
                    let name = name.and_then(|id| ctx.atoms.resolve(id)).map(str::to_string);
                    let doctype = host.dom.create_doctype(name, public_id, system_id);
                    host.dom.append_child(self.root, doctype);
                    self.mode = InsertionMode::BeforeHtml;
                } else {
                    ctx.record_tree_error(ParseErrorCode::MisplacedDoctype);
                }
                Ok(TokenSinkResult::Continue)
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.process_start_tag(name, attrs, self_closing, ctx, host),
            Token::EndTag { name } => {
                self.flush_characters(ctx, host)?;
                let current = self.open.current().map(|entry| entry.key);
                self.process_end_tag(name, ctx, host)?;
                if let Some(node) = current {
                    host.notify_end_tag(node)?;
                }
                Ok(TokenSinkResult::Continue)
            }
            Token::Eof => {
                self.finish(ctx, host)?;
                Ok(TokenSinkResult::Continue)
            }
        }
    }

    fn process_text<L: ParseListener + ?Sized>(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let mut rest = text;
        loop {
            match self.mode {
                InsertionMode::Initial | InsertionMode::BeforeHtml | InsertionMode::BeforeHead => {
                    rest = rest.trim_start_matches(is_html_whitespace);
                    if rest.is_empty() {
                        return Ok(());
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::InHead | InsertionMode::AfterHead => {
                    let trimmed = rest.trim_start_matches(is_html_whitespace);
                    let whitespace = &rest[..rest.len() - trimmed.len()];
                    if !whitespace.is_empty() {
                        self.insert_characters(whitespace, ctx, host)?;
                    }
                    rest = trimmed;
                    if rest.is_empty() {
                        return Ok(());
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::InBody => return self.insert_body_text(rest, ctx, host),
                InsertionMode::Text => return self.insert_characters(rest, ctx, host),
            }
        }
    }

    /// "Anything else" transition of the pre-body modes.
    fn leave_mode_implicitly<L: ParseListener + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        match self.mode {
            InsertionMode::Initial => self.mode = InsertionMode::BeforeHtml,
            InsertionMode::BeforeHtml => {
                self.insert_element(Namespace::Html, self.tags.html, Vec::new(), ctx, host)?;
                self.mode = InsertionMode::BeforeHead;
            }
            InsertionMode::BeforeHead => {
                let head =
                    self.insert_element(Namespace::Html, self.tags.head, Vec::new(), ctx, host)?;
                self.head = Some(head);
                self.mode = InsertionMode::InHead;
            }
            InsertionMode::InHead => {
                self.pop_element(ctx, host)?;
                self.mode = InsertionMode::AfterHead;
            }
            InsertionMode::AfterHead => {
                self.insert_element(Namespace::Html, self.tags.body, Vec::new(), ctx, host)?;
                self.mode = InsertionMode::InBody;
            }
            InsertionMode::InBody | InsertionMode::Text => {}
        }
        Ok(())
    }

    fn process_start_tag<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        attrs: Vec<Attribute>,
        self_closing: bool,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<TokenSinkResult, TreeBuilderError> {
        let tag = ctx
            .atoms
            .resolve_arc(name)
            .ok_or(TreeBuilderError::Invariant("start tag name not interned"))?;
        let tag = tag.as_ref();
        let tags = self.tags;
        loop {
            match self.mode {
                InsertionMode::Initial => self.mode = InsertionMode::BeforeHtml,
                InsertionMode::BeforeHtml => {
                    if name == tags.html {
                        self.insert_element(Namespace::Html, name, attrs, ctx, host)?;
                        self.mode = InsertionMode::BeforeHead;
                        return Ok(TokenSinkResult::Continue);
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::BeforeHead => {
                    if name == tags.html {
                        self.merge_root_attributes(attrs, ctx, host);
                        return Ok(TokenSinkResult::Continue);
                    }
                    if name == tags.head {
                        let head = self.insert_element(Namespace::Html, name, attrs, ctx, host)?;
                        self.head = Some(head);
                        self.mode = InsertionMode::InHead;
                        return Ok(TokenSinkResult::Continue);
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::InHead => {
                    if name == tags.html {
                        self.merge_root_attributes(attrs, ctx, host);
                        return Ok(TokenSinkResult::Continue);
                    }
                    if name == tags.head {
                        ctx.record_tree_error(ParseErrorCode::Other);
                        return Ok(TokenSinkResult::Continue);
                    }
                    if is_head_element(tag) {
                        return self.insert_head_element(name, tag, attrs, ctx, host);
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::AfterHead => {
                    if name == tags.html {
                        self.merge_root_attributes(attrs, ctx, host);
                        return Ok(TokenSinkResult::Continue);
                    }
                    if name == tags.body {
                        self.insert_element(Namespace::Html, name, attrs, ctx, host)?;
                        self.mode = InsertionMode::InBody;
                        return Ok(TokenSinkResult::Continue);
                    }
                    if name == tags.head {
                        ctx.record_tree_error(ParseErrorCode::Other);
                        return Ok(TokenSinkResult::Continue);
                    }
                    if is_head_element(tag)
                        && let Some(head) = self.head
                    {
                        // Head content after </head>: insert into head, then
                        // drop head from the stack again.
                        ctx.record_tree_error(ParseErrorCode::Other);
                        self.open
                            .push(OpenElement::new(head, tags.head, Namespace::Html));
                        let result = self.insert_head_element(name, tag, attrs, ctx, host)?;
                        self.open.remove(head);
                        return Ok(result);
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::InBody => {
                    return self.process_start_tag_in_body(name, tag, attrs, self_closing, ctx, host);
                }
                InsertionMode::Text => {
                    // Raw text never yields start tags; recover by leaving Text.
                    self.mode = self.original_mode;
                }
            }
        }
    }

    /// Elements that are legal in head, inserted into the current node.
    fn insert_head_element<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        tag: &str,
        attrs: Vec<Attribute>,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<TokenSinkResult, TreeBuilderError> {
        self.insert_element(Namespace::Html, name, attrs, ctx, host)?;
        if tags::is_head_void(tag) {
            self.pop_element(ctx, host)?;
            return Ok(TokenSinkResult::Continue);
        }
        Ok(self.enter_raw_text(tag))
    }

    /// Switch to Text mode when `tag` has a raw content model.
    fn enter_raw_text(&mut self, tag: &str) -> TokenSinkResult {
        match tags::raw_content_model(tag, self.config.scripting_enabled) {
            Some(RawKind::Plaintext) => TokenSinkResult::RawData(RawKind::Plaintext),
            Some(kind) => {
                self.original_mode = self.mode;
                self.mode = InsertionMode::Text;
                TokenSinkResult::RawData(kind)
            }
            None => TokenSinkResult::Continue,
        }
    }

    fn process_start_tag_in_body<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        tag: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<TokenSinkResult, TreeBuilderError> {
        let tags = self.tags;
        if let Some((ns, _)) = self.adjusted_current()
            && ns != Namespace::Html
        {
            if !tags::breaks_out_of_foreign(tag) {
                self.insert_element(ns, name, attrs, ctx, host)?;
                if self_closing {
                    self.pop_element(ctx, host)?;
                }
                return Ok(TokenSinkResult::Continue);
            }
            ctx.record_tree_error(ParseErrorCode::Other);
            while let Some(current) = self.open.current()
                && current.ns != Namespace::Html
            {
                self.pop_element(ctx, host)?;
            }
        }

        if name == tags.html {
            ctx.record_tree_error(ParseErrorCode::Other);
            self.merge_root_attributes(attrs, ctx, host);
            return Ok(TokenSinkResult::Continue);
        }
        if name == tags.body {
            ctx.record_tree_error(ParseErrorCode::Other);
            self.merge_body_attributes(attrs, ctx, host);
            return Ok(TokenSinkResult::Continue);
        }
        if name == tags.head {
            ctx.record_tree_error(ParseErrorCode::Other);
            return Ok(TokenSinkResult::Continue);
        }
        if is_head_element(tag) && !(tag == "noscript" && !self.config.scripting_enabled) {
            return self.insert_head_element(name, tag, attrs, ctx, host);
        }
        if name == tags.svg || name == tags.math {
            let ns = if name == tags.svg {
                Namespace::Svg
            } else {
                Namespace::MathMl
            };
            self.insert_element(ns, name, attrs, ctx, host)?;
            if self_closing {
                self.pop_element(ctx, host)?;
            }
            return Ok(TokenSinkResult::Continue);
        }
        if tags.is_list_item(name) {
            self.close_open_list_item(name, ctx, host)?;
        }
        if tags::closes_p(tag) || tags.is_list_item(name) {
            self.close_p_in_button_scope(ctx, host)?;
        }
        if tags::is_heading(tag)
            && let Some(current) = self.open.current()
            && current.ns == Namespace::Html
            && ctx.atoms.resolve(current.name).is_some_and(tags::is_heading)
        {
            ctx.record_tree_error(ParseErrorCode::Other);
            self.pop_element(ctx, host)?;
        }
        if name == tags.button
            && let Some(index) = self.open.find_any_in_scope(
                |open| open == tags.button,
                ScopeKind::InScope,
                &tags.scope,
            )
        {
            ctx.record_tree_error(ParseErrorCode::Other);
            self.generate_implied_end_tags(None, ctx, host)?;
            self.pop_until(index, ctx, host)?;
        }
        if name == tags.option
            && let Some(current) = self.open.current()
            && current.is_html(tags.option)
        {
            self.pop_element(ctx, host)?;
        }
        let (name, tag) = if name == tags.image {
            ctx.record_tree_error(ParseErrorCode::Other);
            (ctx.atoms.intern_ascii_folded("img"), "img")
        } else {
            (name, tag)
        };

        self.insert_element(Namespace::Html, name, attrs, ctx, host)?;
        if tags::is_void(tag) {
            self.pop_element(ctx, host)?;
            return Ok(TokenSinkResult::Continue);
        }
        Ok(self.enter_raw_text(tag))
    }

    fn process_end_tag<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let tag = ctx
            .atoms
            .resolve_arc(name)
            .ok_or(TreeBuilderError::Invariant("end tag name not interned"))?;
        let tag = tag.as_ref();
        let tags = self.tags;
        let structural = name == tags.head || name == tags.body || name == tags.html || name == tags.br;
        loop {
            match self.mode {
                InsertionMode::Initial => self.mode = InsertionMode::BeforeHtml,
                InsertionMode::BeforeHtml | InsertionMode::BeforeHead => {
                    if !structural {
                        ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
                        return Ok(());
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::InHead => {
                    if name == tags.head {
                        self.pop_element(ctx, host)?;
                        self.mode = InsertionMode::AfterHead;
                        return Ok(());
                    }
                    if tag == "noscript"
                        && let Some(current) = self.open.current()
                        && current.is_html(name)
                    {
                        self.pop_element(ctx, host)?;
                        return Ok(());
                    }
                    if !structural {
                        ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
                        return Ok(());
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::AfterHead => {
                    if name == tags.head || !structural {
                        ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
                        return Ok(());
                    }
                    self.leave_mode_implicitly(ctx, host)?;
                }
                InsertionMode::InBody => return self.process_end_tag_in_body(name, tag, ctx, host),
                InsertionMode::Text => {
                    self.pop_element(ctx, host)?;
                    self.mode = self.original_mode;
                    return Ok(());
                }
            }
        }
    }

    fn process_end_tag_in_body<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        tag: &str,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let tags = self.tags;
        if let Some(current) = self.open.current()
            && current.ns != Namespace::Html
        {
            // Foreign content: close the nearest foreign element with this name.
            let foreign_match = self
                .open
                .iter_top_down()
                .take_while(|(_, entry)| entry.ns != Namespace::Html)
                .find(|(_, entry)| entry.name == name)
                .map(|(index, _)| index);
            if let Some(index) = foreign_match {
                return self.pop_until(index, ctx, host);
            }
        }
        if name == tags.body || name == tags.html {
            // Content after </body> keeps going into body.
            return Ok(());
        }
        if name == tags.p {
            if !self.open.has_in_scope(tags.p, ScopeKind::Button, &tags.scope) {
                ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
                self.insert_element(Namespace::Html, tags.p, Vec::new(), ctx, host)?;
            }
            return self.close_p(ctx, host);
        }
        if name == tags.br {
            ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
            self.insert_element(Namespace::Html, tags.br, Vec::new(), ctx, host)?;
            self.pop_element(ctx, host)?;
            return Ok(());
        }
        let scoped = if name == tags.li {
            Some(ScopeKind::ListItem)
        } else if tags.is_list_item(name) || tags::is_block_end(tag) {
            Some(ScopeKind::InScope)
        } else {
            None
        };
        if let Some(kind) = scoped {
            let Some(index) = self
                .open
                .find_any_in_scope(|open| open == name, kind, &tags.scope)
            else {
                ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
                return Ok(());
            };
            self.generate_implied_end_tags(Some(name), ctx, host)?;
            return self.pop_until(index, ctx, host);
        }
        if tags::is_heading(tag) {
            let atoms = &ctx.atoms;
            let heading = self.open.find_any_in_scope(
                |open| atoms.resolve(open).is_some_and(tags::is_heading),
                ScopeKind::InScope,
                &tags.scope,
            );
            let Some(index) = heading else {
                ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
                return Ok(());
            };
            self.generate_implied_end_tags(None, ctx, host)?;
            return self.pop_until(index, ctx, host);
        }
        self.close_any_other(name, ctx, host)
    }

    /// "Any other end tag": close the nearest matching element unless a
    /// special element comes first.
    fn close_any_other<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let mut target = None;
        for (index, entry) in self.open.iter_top_down() {
            if entry.ns != Namespace::Html {
                continue;
            }
            if entry.name == name {
                target = Some(index);
                break;
            }
            if ctx.atoms.resolve(entry.name).is_some_and(tags::is_special) {
                break;
            }
        }
        let Some(index) = target else {
            ctx.record_tree_error(ParseErrorCode::UnexpectedEndTag);
            return Ok(());
        };
        self.generate_implied_end_tags(Some(name), ctx, host)?;
        self.pop_until(index, ctx, host)
    }

    /// `li`/`dd`/`dt` start tags close the open list item of the same family.
    fn close_open_list_item<L: ParseListener + ?Sized>(
        &mut self,
        name: AtomId,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let tags = self.tags;
        let same_family = |open: AtomId| {
            if name == tags.li {
                open == tags.li
            } else {
                open == tags.dd || open == tags.dt
            }
        };
        let mut target = None;
        for (index, entry) in self.open.iter_top_down() {
            if entry.ns != Namespace::Html {
                continue;
            }
            if same_family(entry.name) {
                target = Some((index, entry.name));
                break;
            }
            let Some(open_tag) = ctx.atoms.resolve(entry.name) else {
                break;
            };
            if tags::is_special(open_tag) && !matches!(open_tag, "address" | "div" | "p") {
                break;
            }
        }
        if let Some((index, open_name)) = target {
            self.generate_implied_end_tags(Some(open_name), ctx, host)?;
            self.pop_until(index, ctx, host)?;
        }
        Ok(())
    }

    fn close_p_in_button_scope<L: ParseListener + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        if self
            .open
            .has_in_scope(self.tags.p, ScopeKind::Button, &self.tags.scope)
        {
            self.close_p(ctx, host)?;
        }
        Ok(())
    }

    fn close_p<L: ParseListener + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let p = self.tags.p;
        self.generate_implied_end_tags(Some(p), ctx, host)?;
        if let Some(index) = self.open.position_of(p) {
            self.pop_until(index, ctx, host)?;
        }
        Ok(())
    }

    /// The current node, or the fragment context when only the fragment root
    /// is open.
    fn adjusted_current(&self) -> Option<(Namespace, AtomId)> {
        if let Some(fragment) = self.fragment
            && self.open.len() == 1
        {
            return Some((fragment.context_ns, fragment.context_name));
        }
        self.open.current().map(|entry| (entry.ns, entry.name))
    }
}

fn is_html_whitespace(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\u{0C}' | '\r' | ' ')
}

fn is_head_element(tag: &str) -> bool {
    tags::is_head_void(tag) || matches!(tag, "title" | "style" | "script" | "noframes" | "noscript")
}

#[cfg(test)]
mod tests;
