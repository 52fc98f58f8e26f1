#![no_main]

use html::dom_snapshot::DomSnapshot;
use html::html5::{ListenerContext, ListenerError, ParseListener};
use html::{
    Dom, DriverConfig, Namespace, NodeKey, ParseContext, PumpOutcome, ScriptedHtmlParser,
    WritePolicy,
};
use libfuzzer_sys::fuzz_target;
use std::time::Duration;

const MAX_WRITES: usize = 64;
const MAX_PUMPS: usize = 4096;

/// Derives writes and suspensions from the fuzz input.
struct Scripted<'a> {
    script: &'a [u8],
    cursor: usize,
    writes: usize,
    snippets: &'a [&'a str],
}

impl Scripted<'_> {
    fn next_byte(&mut self) -> u8 {
        if self.script.is_empty() {
            return 0;
        }
        let byte = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        byte
    }

    fn act(&mut self, cx: &mut ListenerContext<'_>) {
        let op = self.next_byte();
        if op & 0b11 == 0 && self.writes < MAX_WRITES {
            self.writes += 1;
            let snippet = self.snippets[usize::from(op >> 2) % self.snippets.len()];
            cx.document_write(snippet);
        }
        if op & 0b1100 == 0b0100 {
            cx.suspend();
        }
    }
}

impl ParseListener for Scripted<'_> {
    fn element_pushed(
        &mut self,
        cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        _name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        self.act(cx);
        Ok(())
    }

    fn element_popped(
        &mut self,
        cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        _name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        self.act(cx);
        Ok(())
    }

    fn end_tag(&mut self, cx: &mut ListenerContext<'_>, _node: NodeKey) -> Result<(), ListenerError> {
        self.act(cx);
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };
    let split = rest.len() / 2;
    let (script, markup) = rest.split_at(split);
    let markup = String::from_utf8_lossy(markup);
    let snippets = [
        "<p>", "</p>", "x", "<script>", "</script>", "<table><tr>", "<!--", "-->", "<b>y</b>",
    ];

    let config = DriverConfig {
        write_policy: if mode & 1 == 0 {
            WritePolicy::SpliceAtToken
        } else {
            WritePolicy::Deferred
        },
        coalesce_text: mode & 2 == 0,
        pump_time_budget: Duration::from_secs(10),
        ..DriverConfig::default()
    };
    let listener = Scripted {
        script,
        cursor: 0,
        writes: 0,
        snippets: &snippets,
    };
    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(config, listener);
    let Ok(mut outcome) = parser.parse(&mut dom, &markup, ParseContext::Document) else {
        return;
    };
    let mut pumps = 0;
    while outcome == PumpOutcome::Suspended {
        pumps += 1;
        if pumps > MAX_PUMPS {
            parser.abandon();
            return;
        }
        if mode & 4 != 0 {
            let _ = parser.document_write("z");
        }
        outcome = match parser.pump(&mut dom) {
            Ok(outcome) => outcome,
            Err(_) => return,
        };
    }
    assert!(!parser.is_active());
    assert_eq!(parser.buffer_depth(), 0);
    let _ = DomSnapshot::of_document(&dom).render();
});
