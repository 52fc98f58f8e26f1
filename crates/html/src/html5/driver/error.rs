//! Driver error types.

use crate::dom::NodeKey;
use crate::html5::tree_builder::TreeBuilderError;
use std::time::Duration;

/// Fatal driver failures. Recoverable HTML parse errors never surface here;
/// they are recorded in the session's parse context.
#[derive(Debug)]
pub enum DriverError {
    /// A single `pump()` ran longer than the configured budget.
    PumpTimeout { elapsed: Duration, budget: Duration },
    /// The interrupt handle was raised.
    Interrupted,
    /// The operation requires an active parse session.
    InactiveSession,
    /// `parse` was called while a session is still running.
    SessionActive,
    /// `pump` was handed a different `Dom` than the session was started with.
    DomMismatch { expected: u64, actual: u64 },
    /// The parse context node is missing or cannot host children.
    InvalidContext(NodeKey),
    /// Tree construction failed (listener error or engine invariant).
    Tree(TreeBuilderError),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::PumpTimeout { elapsed, budget } => write!(
                f,
                "pump exceeded time budget ({} ms > {} ms)",
                elapsed.as_millis(),
                budget.as_millis()
            ),
            DriverError::Interrupted => write!(f, "parse interrupted"),
            DriverError::InactiveSession => write!(f, "no active parse session"),
            DriverError::SessionActive => write!(f, "a parse session is already active"),
            DriverError::DomMismatch { expected, actual } => write!(
                f,
                "session is bound to dom #{expected}, got dom #{actual}"
            ),
            DriverError::InvalidContext(key) => {
                write!(f, "invalid parse context node {}", key.0)
            }
            DriverError::Tree(err) => write!(f, "tree construction failed: {err}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Tree(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeBuilderError> for DriverError {
    fn from(err: TreeBuilderError) -> Self {
        DriverError::Tree(err)
    }
}
