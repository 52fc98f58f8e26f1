use clap::Parser;
use html::dom_snapshot::{DomSnapshot, DomSnapshotOptions};
use html::html5::{ListenerContext, ListenerError, ParseListener};
use html::{
    Dom, DriverConfig, ElementData, Namespace, NodeKey, ParseContext, PumpOutcome,
    ScriptedHtmlParser, WritePolicy,
};
use mimalloc::MiMalloc;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "writeparse")]
#[command(about = "Parse an HTML file through the scripted driver and print the tree")]
struct Args {
    /// HTML file to parse
    path: PathBuf,

    /// Parse as the content of an element with this tag name
    #[arg(long, value_name = "TAG")]
    fragment: Option<String>,

    /// Write `--write` text whenever an element with this name is pushed
    #[arg(long, value_name = "TAG", requires = "write")]
    write_on: Option<String>,

    /// Markup written when `--write-on` matches
    #[arg(long, value_name = "TEXT")]
    write: Option<String>,

    /// How many times `--write-on` may fire
    #[arg(long, default_value_t = 1)]
    max_writes: usize,

    /// Suspend whenever an element with this name is pushed
    #[arg(long, value_name = "TAG")]
    suspend_on: Option<String>,

    /// Queue writes until the current chunk is drained instead of splicing
    /// them after the current token
    #[arg(long)]
    deferred: bool,

    /// Wall-clock budget for one pump, in milliseconds
    #[arg(long, value_name = "MS")]
    budget_ms: Option<u64>,

    /// Print node keys next to every line
    #[arg(long)]
    keys: bool,
}

struct CliListener {
    write_on: Option<(String, String)>,
    writes_left: usize,
    suspend_on: Option<String>,
}

impl ParseListener for CliListener {
    fn element_pushed(
        &mut self,
        cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        if let Some((tag, text)) = &self.write_on
            && tag == name
            && self.writes_left > 0
        {
            self.writes_left -= 1;
            log::info!(target: "writeparse", "write on <{name}>: {} bytes", text.len());
            cx.document_write(text);
        }
        if self.suspend_on.as_deref() == Some(name) {
            cx.suspend();
        }
        Ok(())
    }

    fn end_document(&mut self, dom: &Dom) {
        log::info!(target: "writeparse", "document complete, {} nodes", dom.len());
    }
}

fn run(args: Args) -> Result<String, String> {
    let source = fs::read_to_string(&args.path)
        .map_err(|err| format!("failed to read {}: {err}", args.path.display()))?;

    let mut config = DriverConfig::default();
    if args.deferred {
        config.write_policy = WritePolicy::Deferred;
    }
    if let Some(ms) = args.budget_ms {
        config.pump_time_budget = Duration::from_millis(ms);
    }

    let listener = CliListener {
        write_on: args.write_on.zip(args.write),
        writes_left: args.max_writes,
        suspend_on: args.suspend_on,
    };
    let mut dom = Dom::new();
    let (context, root) = match &args.fragment {
        Some(tag) => {
            let host = dom.create_element(ElementData::new(
                Namespace::Html,
                Arc::from(tag.as_str()),
                Vec::new(),
            ));
            (ParseContext::Element(host), host)
        }
        None => (ParseContext::Document, dom.document()),
    };

    let mut parser = ScriptedHtmlParser::new(config, listener);
    let mut outcome = parser
        .parse(&mut dom, &source, context)
        .map_err(|err| err.to_string())?;
    while outcome == PumpOutcome::Suspended {
        log::info!(
            target: "writeparse",
            "suspended with {} buffered chunks",
            parser.buffer_depth()
        );
        outcome = parser.pump(&mut dom).map_err(|err| err.to_string())?;
    }

    let counters = parser.counters();
    log::info!(
        target: "writeparse",
        "{} tokens, {} chunks, {} suspensions, {} text runs",
        counters.tokens_emitted,
        counters.chunks_pushed,
        counters.suspensions,
        counters.text_flushes
    );
    for error in parser.parse_errors() {
        log::warn!(target: "writeparse", "{error:?}");
    }

    let options = DomSnapshotOptions {
        ignore_ids: !args.keys,
    };
    Ok(DomSnapshot::new(&dom, root, options).render())
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(tree) => {
            println!("{tree}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
