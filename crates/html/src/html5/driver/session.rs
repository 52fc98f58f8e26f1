//! One parse session: tokenizer, tree builder and buffer stack bound to a DOM.

use super::buffers::BufferStack;
use super::config::DriverConfig;
use super::control::ParserControl;
use super::error::DriverError;
use super::watchdog::{InterruptHandle, Watchdog};
use super::{ParseContext, PumpOutcome};
use crate::dom::{Dom, Namespace, NodeData};
use crate::html5::shared::{DocumentParseContext, InputChunk};
use crate::html5::tokenizer::{Html5Tokenizer, TokenizeResult, TokenizerConfig};
use crate::html5::tree_builder::{
    BuildTarget, DEFAULT_COALESCER_CAPACITY, ElementFactory, Html5TreeBuilder, ParseListener,
    TreeBuilderConfig, TreeHost, TreeSink,
};
use std::sync::Arc;

pub(crate) struct ParseSession {
    pub(crate) dom_id: u64,
    pub(crate) ctx: DocumentParseContext,
    tokenizer: Html5Tokenizer,
    builder: Html5TreeBuilder,
    pub(crate) buffers: BufferStack,
    pub(crate) suspended: bool,
}

impl ParseSession {
    /// Validate the context against `dom` and set up a session whose only
    /// buffer is `source`.
    pub(crate) fn start(
        config: &DriverConfig,
        dom: &mut Dom,
        source: &str,
        context: ParseContext,
    ) -> Result<Self, DriverError> {
        let target = match context {
            ParseContext::Document => BuildTarget::Document,
            ParseContext::Element(node) => {
                let element = dom.element(node).ok_or(DriverError::InvalidContext(node))?;
                BuildTarget::Fragment {
                    context_ns: element.ns,
                    context_name: Arc::clone(&element.name),
                    into: node,
                }
            }
            ParseContext::Fragment(node) => {
                if !matches!(dom.get(node), Some(NodeData::DocumentFragment)) {
                    return Err(DriverError::InvalidContext(node));
                }
                BuildTarget::Fragment {
                    context_ns: Namespace::Html,
                    context_name: Arc::from("body"),
                    into: node,
                }
            }
        };
        let context_name = match &target {
            BuildTarget::Document => None,
            BuildTarget::Fragment { context_name, .. } => Some(Arc::clone(context_name)),
        };

        let mut ctx = DocumentParseContext::new();
        let mut tokenizer = Html5Tokenizer::new(TokenizerConfig::default(), &mut ctx);
        let builder_config = TreeBuilderConfig {
            coalesce_text: config.coalesce_text,
            coalescer_capacity: DEFAULT_COALESCER_CAPACITY,
            scripting_enabled: config.scripting_enabled,
        };
        let builder = Html5TreeBuilder::new(builder_config, &mut ctx, dom, target);
        if let Some(kind) = builder.initial_content_model()
            && let Some(name) = context_name
        {
            tokenizer.set_initial_content_model(kind, &name);
        }

        let mut buffers = BufferStack::default();
        buffers.push(InputChunk::new(source));
        ctx.counters.chunks_pushed = 1;
        Ok(Self {
            dom_id: dom.id(),
            ctx,
            tokenizer,
            builder,
            buffers,
            suspended: false,
        })
    }

    /// The pump loop. Returns when input is exhausted and the document is
    /// complete, or when a host asked for a suspension.
    pub(crate) fn pump<L: ParseListener + ?Sized>(
        &mut self,
        dom: &mut Dom,
        listener: &mut L,
        mut factory: Option<&mut (dyn ElementFactory + 'static)>,
        control: &mut ParserControl,
        interrupt: &InterruptHandle,
        config: &DriverConfig,
    ) -> Result<PumpOutcome, DriverError> {
        let watchdog = Watchdog::start(config.pump_time_budget);
        let Self {
            ctx,
            tokenizer,
            builder,
            buffers,
            ..
        } = self;
        loop {
            if interrupt.take() {
                return Err(DriverError::Interrupted);
            }
            if let Some(chunk) = control.writes_mut().materialize() {
                log::debug!(
                    target: "html5.driver",
                    "splicing {} written bytes above depth {}",
                    chunk.len(),
                    buffers.depth()
                );
                buffers.push(chunk);
                ctx.counters.chunks_pushed = ctx.counters.chunks_pushed.saturating_add(1);
            }
            control.clear_suspension();

            let Some(chunk) = buffers.top_mut() else {
                let host = TreeHost::new(&mut *dom, &mut *listener, factory.as_deref_mut(), &mut *control);
                let mut sink = TreeSink::new(&mut *builder, host);
                tokenizer.eof(ctx, &mut sink)?;
                return Ok(PumpOutcome::Finished);
            };
            if chunk.has_more() {
                let host = TreeHost::new(&mut *dom, &mut *listener, factory.as_deref_mut(), &mut *control);
                let mut sink = TreeSink::new(&mut *builder, host);
                let result = tokenizer.tokenize_chunk(chunk, ctx, &mut sink)?;
                if result == TokenizeResult::Suspended && control.suspension().requested {
                    return Ok(PumpOutcome::Suspended);
                }
            }
            if chunk.is_exhausted() {
                buffers.pop_exhausted();
            }
            watchdog.check()?;
        }
    }

    pub(crate) fn tokenizer(&self) -> &Html5Tokenizer {
        &self.tokenizer
    }

    pub(crate) fn builder(&self) -> &Html5TreeBuilder {
        &self.builder
    }
}
