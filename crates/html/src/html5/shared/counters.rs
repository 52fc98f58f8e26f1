//! Counters for instrumentation.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub tokens_emitted: u64,
    pub parse_errors: u64,
    /// Input chunks pushed onto the buffer stack (initial source included).
    pub chunks_pushed: u64,
    /// Pump invocations that returned to the caller suspended.
    pub suspensions: u64,
    /// Coalesced text runs committed to the tree.
    pub text_flushes: u64,
}
