//! Reentrant parse driver.
//!
//! [`ScriptedHtmlParser`] feeds a [`Dom`] from a source string through the
//! HTML5 tokenizer and tree builder while hosts write more markup into the
//! input (`document.write` style) or suspend the parse from listener hooks.
//!
//! Input lives on a stack of chunks. Written text is materialized as a new
//! chunk on top of the active one at the start of a pump iteration, so it is
//! consumed before the rest of the chunk that was being tokenized when the
//! write happened. Suspension is cooperative and only happens between
//! tokens; a suspended session resumes on the next [`ScriptedHtmlParser::pump`].
//!
//! Session lifecycle:
//! - `parse` starts a session and pumps once.
//! - `pump` resumes a suspended session.
//! - The session ends when the document completes (listener gets
//!   `end_document`), when tree construction fails (listener still gets
//!   `end_document`), or on interrupt, timeout or `abandon` (no
//!   `end_document`).

mod buffers;
mod config;
mod control;
mod error;
mod session;
mod watchdog;

pub use config::{DEFAULT_PUMP_TIME_BUDGET, DriverConfig, WritePolicy};
pub use control::ParserControl;
pub use error::DriverError;
pub use watchdog::InterruptHandle;

use crate::dom::{Dom, NodeKey};
use crate::html5::shared::{Counters, ParseError};
use crate::html5::tree_builder::{ElementFactory, ParseListener};
use session::ParseSession;

/// Where parsed nodes go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseContext {
    /// Build a whole document under `Dom::document()`.
    Document,
    /// Parse as the content of this element and append the results to it.
    Element(NodeKey),
    /// Parse with a `body` context and append the results to this
    /// `DocumentFragment` node.
    Fragment(NodeKey),
}

/// How a `parse`/`pump` call returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Input exhausted and the document complete; the session is over.
    Finished,
    /// A host requested a suspension; call `pump` to continue.
    Suspended,
}

/// HTML parser driver that accepts writes and suspensions while it runs.
pub struct ScriptedHtmlParser<L: ParseListener> {
    config: DriverConfig,
    listener: L,
    factory: Option<Box<dyn ElementFactory>>,
    control: ParserControl,
    interrupt: InterruptHandle,
    session: Option<ParseSession>,
    last_counters: Counters,
    last_errors: Vec<ParseError>,
}

impl<L: ParseListener> ScriptedHtmlParser<L> {
    pub fn new(config: DriverConfig, listener: L) -> Self {
        let control = ParserControl::new(config.write_policy);
        Self {
            config,
            listener,
            factory: None,
            control,
            interrupt: InterruptHandle::new(),
            session: None,
            last_counters: Counters::default(),
            last_errors: Vec::new(),
        }
    }

    /// Use `factory` for every element created by this parser's sessions.
    pub fn with_element_factory(mut self, factory: impl ElementFactory + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Handle that aborts the running pump from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Start a session over `source` and pump until it finishes or suspends.
    pub fn parse(
        &mut self,
        dom: &mut Dom,
        source: &str,
        context: ParseContext,
    ) -> Result<PumpOutcome, DriverError> {
        if self.session.is_some() {
            return Err(DriverError::SessionActive);
        }
        let session = ParseSession::start(&self.config, dom, source, context)?;
        log::debug!(
            target: "html5.driver",
            "session started: {context:?}, {} bytes, dom #{}",
            source.len(),
            dom.id()
        );
        // A stale interrupt from a previous session must not kill this one.
        self.interrupt.take();
        self.control.activate();
        self.session = Some(session);
        self.pump(dom)
    }

    /// Resume the active session.
    pub fn pump(&mut self, dom: &mut Dom) -> Result<PumpOutcome, DriverError> {
        let Self {
            config,
            listener,
            factory,
            control,
            interrupt,
            session,
            ..
        } = &mut *self;
        let Some(active) = session.as_mut() else {
            return Err(DriverError::InactiveSession);
        };
        if active.dom_id != dom.id() {
            return Err(DriverError::DomMismatch {
                expected: active.dom_id,
                actual: dom.id(),
            });
        }
        active.suspended = false;
        let result = active.pump(
            dom,
            listener,
            factory.as_deref_mut(),
            control,
            interrupt,
            config,
        );
        match result {
            Ok(PumpOutcome::Suspended) => {
                active.suspended = true;
                active.ctx.counters.suspensions = active.ctx.counters.suspensions.saturating_add(1);
                log::debug!(
                    target: "html5.driver",
                    "pump suspended with {} bytes buffered, {} pending",
                    active.buffers.remaining_len(),
                    control.pending_write_len()
                );
                Ok(PumpOutcome::Suspended)
            }
            Ok(PumpOutcome::Finished) => {
                self.finish_session(dom);
                Ok(PumpOutcome::Finished)
            }
            Err(DriverError::Tree(err)) => {
                log::debug!(target: "html5.driver", "tree construction failed: {err}");
                self.finish_session(dom);
                Err(DriverError::Tree(err))
            }
            Err(err) => {
                log::warn!(target: "html5.driver", "parse aborted: {err}");
                self.teardown();
                Err(err)
            }
        }
    }

    /// Queue markup at the current parse position of the active session.
    pub fn document_write(&mut self, text: &str) -> Result<(), DriverError> {
        if self.control.document_write(text) {
            Ok(())
        } else {
            Err(DriverError::InactiveSession)
        }
    }

    /// Request a suspension of the active session.
    ///
    /// Suspension flags are reset at every pump iteration, so a request made
    /// between pumps is dropped when the next pump starts; listener hooks use
    /// [`ListenerContext::suspend`](crate::html5::tree_builder::ListenerContext::suspend)
    /// to stop a running pump.
    pub fn suspend(&mut self) -> Result<(), DriverError> {
        if !self.control.is_active() {
            return Err(DriverError::InactiveSession);
        }
        self.control.suspend();
        Ok(())
    }

    pub fn inject_write_buffer(&mut self) {
        self.control.inject_write_buffer();
    }

    pub fn clear_write_buffer(&mut self) {
        self.control.clear_write_buffer();
    }

    /// Drop the active session without notifying `end_document`.
    pub fn abandon(&mut self) {
        if self.session.is_some() {
            log::debug!(target: "html5.driver", "session abandoned");
            self.teardown();
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.suspended)
    }

    /// Number of input chunks on the buffer stack (0 without a session).
    pub fn buffer_depth(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.buffers.depth())
    }

    /// Counters of the active session, or of the last finished one.
    pub fn counters(&self) -> &Counters {
        self.session
            .as_ref()
            .map_or(&self.last_counters, |session| &session.ctx.counters)
    }

    /// Recoverable parse errors of the active session, or of the last one.
    pub fn parse_errors(&self) -> &[ParseError] {
        self.session
            .as_ref()
            .map_or(&self.last_errors, |session| &session.ctx.errors)
    }

    fn finish_session(&mut self, dom: &Dom) {
        if let Some(session) = &self.session {
            log::debug!(
                target: "html5.driver",
                "session finished: {} tokens, {} bytes, {} chunks, buffer depth {}, open depth {}",
                session.ctx.counters.tokens_emitted,
                session.tokenizer().position(),
                session.ctx.counters.chunks_pushed,
                session.buffers.max_depth(),
                session.builder().max_open_depth()
            );
        }
        self.teardown();
        self.listener.end_document(dom);
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            let unread = session.buffers.remaining_len();
            session.buffers.clear();
            if unread > 0 {
                log::debug!(target: "html5.driver", "discarded {unread} unread bytes at session end");
            }
            self.last_counters = session.ctx.counters;
            self.last_errors = session.ctx.errors;
        }
        let dropped = self.control.deactivate();
        if dropped > 0 {
            log::debug!(target: "html5.driver", "dropped {dropped} written bytes at session end");
        }
    }
}
