//! HTML5 parsing path: tokenizer, tree builder and the reentrant driver.

pub mod driver;
pub(crate) mod shared;
pub mod tokenizer;
pub mod tree_builder;

// Public re-exports: consumers should import from `html::html5::*` rather than `shared::*`.
pub use driver::{
    DEFAULT_PUMP_TIME_BUDGET, DriverConfig, DriverError, InterruptHandle, ParseContext,
    ParserControl, PumpOutcome, ScriptedHtmlParser, WritePolicy,
};
pub use shared::{
    AtomId, AtomTable, Attribute, Counters, DocumentParseContext, InputChunk, ParseError,
    ParseErrorCode, Token,
};
pub use tokenizer::{
    Html5Tokenizer, RawKind, TokenSink, TokenSinkResult, TokenizeResult, TokenizerConfig,
    TokenizerStats,
};
pub use tree_builder::{
    BuildTarget, ElementFactory, FactoryError, Html5TreeBuilder, ListenerContext, ListenerError,
    NoopListener, ParseListener, TreeBuilderConfig, TreeBuilderError, TreeHost, TreeSink,
};
