//! DOM insertion helpers: every tree mutation and its listener notification
//! goes through here.

use super::listener::ParseListener;
use super::modes::InsertionMode;
use super::sink::TreeHost;
use super::stack::OpenElement;
use super::{Html5TreeBuilder, TreeBuilderError, factory, is_html_whitespace, tags};
use crate::dom::{Dom, Namespace, NodeKey};
use crate::html5::shared::{AtomId, Attribute, DocumentParseContext, ParseErrorCode};
use std::sync::Arc;

impl Html5TreeBuilder {
    /// Parent for the next inserted node when no foster parenting applies.
    fn insertion_parent(&self) -> NodeKey {
        self.open.current().map_or(self.root, |entry| entry.key)
    }

    fn current_is_table_context(&self) -> bool {
        self.open
            .current()
            .is_some_and(|entry| entry.ns == Namespace::Html && self.tags.is_table_context(entry.name))
    }

    /// Foster parent location: right before the innermost open table, or at
    /// the end of the element below it when the table is detached.
    fn foster_location(&self, dom: &Dom) -> (NodeKey, Option<NodeKey>) {
        let Some(index) = self.open.position_of(self.tags.table) else {
            return (self.insertion_parent(), None);
        };
        let table = self.open.get(index).map_or(self.root, |entry| entry.key);
        if let Some(parent) = dom.parent(table) {
            return (parent, Some(table));
        }
        let below = index
            .checked_sub(1)
            .and_then(|below| self.open.get(below))
            .map_or(self.root, |entry| entry.key);
        (below, None)
    }

    fn resolve_attributes(
        attrs: Vec<Attribute>,
        ctx: &DocumentParseContext,
    ) -> Result<Vec<(Arc<str>, Option<String>)>, TreeBuilderError> {
        attrs
            .into_iter()
            .map(|attr| {
                ctx.atoms
                    .resolve_arc(attr.name)
                    .map(|name| (name, attr.value))
                    .ok_or(TreeBuilderError::Invariant("attribute name not interned"))
            })
            .collect()
    }

    /// Create an element, insert it, push it on the stack and notify.
    pub(super) fn insert_element<L: ParseListener + ?Sized>(
        &mut self,
        ns: Namespace,
        name: AtomId,
        attrs: Vec<Attribute>,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<NodeKey, TreeBuilderError> {
        self.flush_characters(ctx, host)?;
        let tag = ctx
            .atoms
            .resolve_arc(name)
            .ok_or(TreeBuilderError::Invariant("element name not interned"))?;
        let attributes = Self::resolve_attributes(attrs, ctx)?;
        let element = factory::build_element(
            host.factory.as_deref_mut(),
            ns,
            Arc::clone(&tag),
            attributes,
        );
        let node = host.dom.create_element(element);

        let foster = ns == Namespace::Html
            && self.current_is_table_context()
            && !tags::is_table_content(&tag);
        if foster {
            ctx.record_tree_error(ParseErrorCode::FosterParentedContent);
            match self.foster_location(host.dom) {
                (parent, Some(before)) => host.dom.insert_before(parent, node, before),
                (parent, None) => host.dom.append_child(parent, node),
            }
        } else {
            host.dom.append_child(self.insertion_parent(), node);
        }
        self.open.push(OpenElement::new(node, name, ns));
        log::trace!(target: "html5.tree_builder", "push {ns:?}:{tag} as {}", node.0);
        host.notify_pushed(ns, &tag, node)?;
        Ok(node)
    }

    /// Pop the current node and notify. The synthetic fragment root is popped
    /// silently.
    pub(super) fn pop_element<L: ParseListener + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<Option<OpenElement>, TreeBuilderError> {
        self.flush_characters(ctx, host)?;
        let Some(entry) = self.open.pop() else {
            return Ok(None);
        };
        if self
            .fragment
            .is_some_and(|fragment| fragment.root == entry.key)
        {
            return Ok(Some(entry));
        }
        let name = ctx
            .atoms
            .resolve(entry.name)
            .ok_or(TreeBuilderError::Invariant("open element name not interned"))?;
        log::trace!(target: "html5.tree_builder", "pop {:?}:{name} ({})", entry.ns, entry.key.0);
        host.notify_popped(entry.ns, name, entry.key)?;
        Ok(Some(entry))
    }

    /// Pop until the stack holds exactly `len` entries.
    pub(super) fn pop_until<L: ParseListener + ?Sized>(
        &mut self,
        len: usize,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        while self.open.len() > len {
            self.pop_element(ctx, host)?;
        }
        Ok(())
    }

    pub(super) fn generate_implied_end_tags<L: ParseListener + ?Sized>(
        &mut self,
        except: Option<AtomId>,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        while let Some(current) = self.open.current()
            && current.ns == Namespace::Html
            && Some(current.name) != except
            && ctx
                .atoms
                .resolve(current.name)
                .is_some_and(tags::has_implied_end)
        {
            self.pop_element(ctx, host)?;
        }
        Ok(())
    }

    /// Hand the pending character run to the listener and the tree.
    pub(super) fn flush_characters<L: ParseListener + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let Some(text) = self.coalescer.take_pending() else {
            return Ok(());
        };
        self.commit_text(text, ctx, host)
    }

    fn commit_text<L: ParseListener + ?Sized>(
        &mut self,
        text: String,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        let parent = self.insertion_parent();
        ctx.counters.text_flushes = ctx.counters.text_flushes.saturating_add(1);
        let text = host.filter_characters(parent, text)?;
        if !text.is_empty() {
            host.dom.append_text(parent, &text);
        }
        Ok(())
    }

    /// Characters for the current node, through the coalescer when enabled.
    pub(super) fn insert_characters<L: ParseListener + ?Sized>(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        if !self.config.coalesce_text {
            return self.commit_text(text.to_string(), ctx, host);
        }
        if !self.coalescer.accumulate(text) {
            return Err(TreeBuilderError::Invariant(
                "characters accumulated outside a coalescing session",
            ));
        }
        Ok(())
    }

    /// Body text; non-whitespace runs under a table are foster parented.
    pub(super) fn insert_body_text<L: ParseListener + ?Sized>(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        if self.current_is_table_context() && !text.chars().all(is_html_whitespace) {
            return self.foster_parent_text(text, ctx, host);
        }
        self.insert_characters(text, ctx, host)
    }

    /// Foster-parented characters bypass coalescing and the listener and are
    /// inserted one at a time.
    fn foster_parent_text<L: ParseListener + ?Sized>(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        self.flush_characters(ctx, host)?;
        ctx.record_tree_error(ParseErrorCode::FosterParentedContent);
        let (parent, before) = self.foster_location(host.dom);
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let ch = ch.encode_utf8(&mut buf);
            match before {
                Some(before) => host.dom.insert_text_before(parent, before, ch),
                None => host.dom.append_text(parent, ch),
            };
        }
        Ok(())
    }

    pub(super) fn insert_comment<L: ParseListener + ?Sized>(
        &mut self,
        text: String,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        self.flush_characters(ctx, host)?;
        let comment = host.dom.create_comment(text);
        host.dom.append_child(self.insertion_parent(), comment);
        Ok(())
    }

    /// Copy attributes missing on the root `html` element.
    pub(super) fn merge_root_attributes<L: ParseListener + ?Sized>(
        &self,
        attrs: Vec<Attribute>,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) {
        if let Some(root) = self.open.get(0)
            && root.is_html(self.tags.html)
        {
            self.merge_attributes(root.key, attrs, ctx, host.dom);
        }
    }

    /// Copy attributes missing on `body`.
    pub(super) fn merge_body_attributes<L: ParseListener + ?Sized>(
        &self,
        attrs: Vec<Attribute>,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) {
        if let Some(body) = self.open.get(1)
            && body.is_html(self.tags.body)
        {
            self.merge_attributes(body.key, attrs, ctx, host.dom);
        }
    }

    fn merge_attributes(
        &self,
        node: NodeKey,
        attrs: Vec<Attribute>,
        ctx: &DocumentParseContext,
        dom: &mut Dom,
    ) {
        let Ok(attrs) = Self::resolve_attributes(attrs, ctx) else {
            return;
        };
        let Some(element) = dom.element_mut(node) else {
            return;
        };
        for (name, value) in attrs {
            if !element.attributes.iter().any(|(existing, _)| *existing == name) {
                element.attributes.push((name, value));
            }
        }
    }

    /// End of input: close everything, then move fragment results into place.
    pub(super) fn finish<L: ParseListener + ?Sized>(
        &mut self,
        ctx: &mut DocumentParseContext,
        host: &mut TreeHost<'_, L>,
    ) -> Result<(), TreeBuilderError> {
        if self.mode == InsertionMode::Text {
            ctx.record_tree_error(ParseErrorCode::UnexpectedEof);
            self.pop_element(ctx, host)?;
            self.mode = self.original_mode;
        }
        while !matches!(self.mode, InsertionMode::InBody | InsertionMode::Text) {
            self.leave_mode_implicitly(ctx, host)?;
        }
        self.flush_characters(ctx, host)?;
        self.pop_until(0, ctx, host)?;
        if let Some(fragment) = self.fragment {
            host.dom.reparent_children(fragment.root, fragment.into);
        }
        self.coalescer.end();
        self.finished = true;
        log::debug!(
            target: "html5.tree_builder",
            "tree complete: max depth {}, {} text flushes",
            self.open.max_depth(),
            ctx.counters.text_flushes
        );
        Ok(())
    }
}
