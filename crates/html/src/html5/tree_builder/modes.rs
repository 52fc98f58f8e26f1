//! HTML5 insertion modes used by the tree builder state machine.
//!
//! Core v0 implements only the subset needed for body content; table, select,
//! template and frameset modes are folded into `InBody` handling.

/// HTML5 tree-construction insertion mode (Core v0 subset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum InsertionMode {
    #[default]
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    AfterHead,
    InBody,
    /// Raw text element content; returns to the saved original mode.
    Text,
}
