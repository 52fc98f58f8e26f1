//! Tree-event listener bridge.
//!
//! Hosts observe tree construction through [`ParseListener`]. Every hook gets
//! a [`ListenerContext`] with read access to the DOM under construction and
//! the [`ParserControl`] used to write into the input or suspend the parse.

use crate::dom::{Dom, Namespace, NodeKey};
use crate::html5::driver::ParserControl;

/// Failure raised by a listener hook. Aborts the parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener failed: {}", self.message)
    }
}

impl std::error::Error for ListenerError {}

/// What a listener hook may touch while the parse is running.
pub struct ListenerContext<'a> {
    dom: &'a Dom,
    control: &'a mut ParserControl,
}

impl<'a> ListenerContext<'a> {
    pub(crate) fn new(dom: &'a Dom, control: &'a mut ParserControl) -> Self {
        Self { dom, control }
    }

    pub fn dom(&self) -> &Dom {
        self.dom
    }

    /// Queue text at the current parse position.
    pub fn document_write(&mut self, text: &str) {
        let accepted = self.control.document_write(text);
        debug_assert!(accepted, "listener hooks only run inside a session");
    }

    pub fn suspend(&mut self) {
        self.control.suspend();
    }

    pub fn inject_write_buffer(&mut self) {
        self.control.inject_write_buffer();
    }

    pub fn clear_write_buffer(&mut self) {
        self.control.clear_write_buffer();
    }

    pub fn pending_write_len(&self) -> usize {
        self.control.pending_write_len()
    }
}

/// Observer of tree construction events.
///
/// All hooks default to doing nothing.
pub trait ParseListener {
    /// An element was created and inserted, before any of its children.
    fn element_pushed(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        _name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// An element left the stack of open elements.
    fn element_popped(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        _name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// An explicit end tag was processed. `node` is the element that was
    /// current when the end tag arrived.
    fn end_tag(&mut self, _cx: &mut ListenerContext<'_>, _node: NodeKey) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A text run is about to be appended to `parent`; the returned text is
    /// what gets committed.
    fn append_characters(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _parent: NodeKey,
        text: String,
    ) -> Result<String, ListenerError> {
        Ok(text)
    }

    /// Tokenization and tree construction are over. Delivered exactly once
    /// per session, also when tree construction failed.
    fn end_document(&mut self, _dom: &Dom) {}
}

/// Listener that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl ParseListener for NoopListener {}

impl<L: ParseListener + ?Sized> ParseListener for &mut L {
    fn element_pushed(
        &mut self,
        cx: &mut ListenerContext<'_>,
        ns: Namespace,
        name: &str,
        node: NodeKey,
    ) -> Result<(), ListenerError> {
        (**self).element_pushed(cx, ns, name, node)
    }

    fn element_popped(
        &mut self,
        cx: &mut ListenerContext<'_>,
        ns: Namespace,
        name: &str,
        node: NodeKey,
    ) -> Result<(), ListenerError> {
        (**self).element_popped(cx, ns, name, node)
    }

    fn end_tag(&mut self, cx: &mut ListenerContext<'_>, node: NodeKey) -> Result<(), ListenerError> {
        (**self).end_tag(cx, node)
    }

    fn append_characters(
        &mut self,
        cx: &mut ListenerContext<'_>,
        parent: NodeKey,
        text: String,
    ) -> Result<String, ListenerError> {
        (**self).append_characters(cx, parent, text)
    }

    fn end_document(&mut self, dom: &Dom) {
        (**self).end_document(dom)
    }
}
