//! Reentrant HTML parsing for hosts that write into the input while it is
//! being parsed.
//!
//! The entry point is [`html5::ScriptedHtmlParser`], which drives the HTML5
//! tokenizer and tree builder over a caller-owned [`dom::Dom`].

pub mod dom;
#[cfg(any(test, feature = "dom-snapshot"))]
pub mod dom_snapshot;
mod entities;
pub mod html5;

pub use dom::{Dom, ElementData, Namespace, NodeData, NodeKey};
pub use html5::{
    DriverConfig, DriverError, ParseContext, ParseListener, PumpOutcome, ScriptedHtmlParser,
    WritePolicy,
};
