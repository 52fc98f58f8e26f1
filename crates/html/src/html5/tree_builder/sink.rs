//! Token sink glue between the tokenizer and the tree builder.

use super::factory::ElementFactory;
use super::listener::{ListenerContext, ListenerError, ParseListener};
use super::{Html5TreeBuilder, TreeBuilderError};
use crate::dom::{Dom, Namespace, NodeKey};
use crate::html5::driver::ParserControl;
use crate::html5::shared::{DocumentParseContext, Token};
use crate::html5::tokenizer::{TokenSink, TokenSinkResult};

/// Everything outside the tree builder that tree construction touches for
/// one tokenization pass.
pub struct TreeHost<'a, L: ParseListener + ?Sized> {
    pub(crate) dom: &'a mut Dom,
    pub(crate) listener: &'a mut L,
    pub(crate) factory: Option<&'a mut (dyn ElementFactory + 'static)>,
    pub(crate) control: &'a mut ParserControl,
}

impl<'a, L: ParseListener + ?Sized> TreeHost<'a, L> {
    pub fn new(
        dom: &'a mut Dom,
        listener: &'a mut L,
        factory: Option<&'a mut (dyn ElementFactory + 'static)>,
        control: &'a mut ParserControl,
    ) -> Self {
        Self {
            dom,
            listener,
            factory,
            control,
        }
    }

    pub(crate) fn notify_pushed(
        &mut self,
        ns: Namespace,
        name: &str,
        node: NodeKey,
    ) -> Result<(), ListenerError> {
        let mut cx = ListenerContext::new(self.dom, self.control);
        self.listener.element_pushed(&mut cx, ns, name, node)
    }

    pub(crate) fn notify_popped(
        &mut self,
        ns: Namespace,
        name: &str,
        node: NodeKey,
    ) -> Result<(), ListenerError> {
        let mut cx = ListenerContext::new(self.dom, self.control);
        self.listener.element_popped(&mut cx, ns, name, node)
    }

    pub(crate) fn notify_end_tag(&mut self, node: NodeKey) -> Result<(), ListenerError> {
        let mut cx = ListenerContext::new(self.dom, self.control);
        self.listener.end_tag(&mut cx, node)
    }

    pub(crate) fn filter_characters(
        &mut self,
        parent: NodeKey,
        text: String,
    ) -> Result<String, ListenerError> {
        let mut cx = ListenerContext::new(self.dom, self.control);
        self.listener.append_characters(&mut cx, parent, text)
    }
}

/// [`TokenSink`] feeding one tree builder for one tokenization pass.
///
/// After every token, pending writes may arm a driver suspension (see
/// `WritePolicy`); the tokenizer observes it through `yield_requested`.
pub struct TreeSink<'a, L: ParseListener + ?Sized> {
    builder: &'a mut Html5TreeBuilder,
    host: TreeHost<'a, L>,
}

impl<'a, L: ParseListener + ?Sized> TreeSink<'a, L> {
    pub fn new(builder: &'a mut Html5TreeBuilder, host: TreeHost<'a, L>) -> Self {
        Self { builder, host }
    }
}

impl<L: ParseListener + ?Sized> TokenSink for TreeSink<'_, L> {
    type Error = TreeBuilderError;

    fn process_token(
        &mut self,
        token: Token,
        ctx: &mut DocumentParseContext,
    ) -> Result<TokenSinkResult, Self::Error> {
        let result = self.builder.process_token(token, ctx, &mut self.host)?;
        self.host.control.after_token();
        Ok(result)
    }

    fn yield_requested(&self) -> bool {
        self.host.control.suspension().should_yield()
    }
}
