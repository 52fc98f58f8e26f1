//! Parser control surface shared between the pump loop and listener hooks.

use super::buffers::PendingWriteBuffer;
use super::config::WritePolicy;

/// Suspension flags for the running tokenization pass.
///
/// Both flags are cleared at the start of every pump iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SuspensionState {
    /// A host asked the pump to return to its caller.
    pub(crate) requested: bool,
    /// The driver paused tokenization to splice pending writes; the pump
    /// keeps going.
    pub(crate) armed_by_driver: bool,
}

impl SuspensionState {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn should_yield(self) -> bool {
        self.requested || self.armed_by_driver
    }
}

/// Handle through which hosts steer a running parse.
///
/// Listener hooks reach it through [`ListenerContext`](crate::html5::ListenerContext);
/// [`ScriptedHtmlParser`](crate::html5::ScriptedHtmlParser) forwards its own
/// methods to it between pumps.
#[derive(Debug)]
pub struct ParserControl {
    writes: PendingWriteBuffer,
    suspension: SuspensionState,
    policy: WritePolicy,
    active: bool,
}

impl ParserControl {
    pub(crate) fn new(policy: WritePolicy) -> Self {
        Self {
            writes: PendingWriteBuffer::default(),
            suspension: SuspensionState::default(),
            policy,
            active: false,
        }
    }

    /// Queue text for insertion at the current parse position.
    ///
    /// Writes issued outside a parse session are dropped and return `false`.
    pub fn document_write(&mut self, text: &str) -> bool {
        if !self.active {
            return false;
        }
        self.writes.append(text);
        true
    }

    /// Ask the pump to stop before the next token and return to its caller.
    pub fn suspend(&mut self) {
        if self.active {
            self.suspension.requested = true;
        }
    }

    /// Pause tokenization at the next token boundary when writes are pending,
    /// so the pump splices them in before continuing with the active chunk.
    pub fn inject_write_buffer(&mut self) {
        if self.active && !self.writes.is_empty() {
            self.suspension.armed_by_driver = true;
        }
    }

    /// Drop all pending, not yet materialized writes.
    pub fn clear_write_buffer(&mut self) {
        self.writes.clear();
    }

    pub fn pending_write_len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
        self.suspension.clear();
        self.writes.clear();
    }

    /// Session teardown. Returns the number of discarded write bytes.
    pub(crate) fn deactivate(&mut self) -> usize {
        let dropped = self.writes.len();
        self.active = false;
        self.suspension.clear();
        self.writes.clear();
        dropped
    }

    pub(crate) fn writes_mut(&mut self) -> &mut PendingWriteBuffer {
        &mut self.writes
    }

    pub(crate) fn suspension(&self) -> SuspensionState {
        self.suspension
    }

    pub(crate) fn clear_suspension(&mut self) {
        self.suspension.clear();
    }

    /// Called after every token the tree builder processed.
    pub(crate) fn after_token(&mut self) {
        if self.policy == WritePolicy::SpliceAtToken {
            self.inject_write_buffer();
        }
    }
}
