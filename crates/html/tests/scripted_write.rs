use html::dom_snapshot::{DomSnapshot, DomSnapshotOptions, NodeRef, assert_dom_eq};
use html::html5::{
    ElementFactory, FactoryError, ListenerContext, ListenerError, NoopListener, ParseListener,
};
use html::{
    Dom, DriverConfig, DriverError, ElementData, Namespace, NodeKey, ParseContext, PumpOutcome,
    ScriptedHtmlParser,
};
use std::sync::Arc;
use std::time::Duration;

const SOURCE: &str = "<div id=top><p>one</p><p>two <b>three</b> four</p><ul><li>x<li>y</ul></div>tail";
const SNIPPET: &str = "<i>w</i>";

fn parse_static(source: &str) -> Dom {
    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), NoopListener);
    assert_eq!(
        parser
            .parse(&mut dom, source, ParseContext::Document)
            .expect("static parse"),
        PumpOutcome::Finished
    );
    dom
}

fn assert_same_document(expected: &Dom, actual: &Dom) {
    assert_dom_eq(
        NodeRef::new(expected, expected.document()),
        NodeRef::new(actual, actual.document()),
        DomSnapshotOptions::default(),
    );
}

/// Byte offset just past the `nth` start tag named `tag` in `source`.
fn after_start_tag(source: &str, tag: &str, nth: usize) -> usize {
    let open = format!("<{tag}");
    let mut from = 0;
    for seen in 0..=nth {
        let start = from
            + source[from..]
                .find(&open)
                .unwrap_or_else(|| panic!("start tag {tag} #{seen} not found"));
        from = start + source[start..].find('>').expect("unterminated tag") + 1;
    }
    from
}

/// Writes `text` when the `nth` element named `tag` is pushed.
struct WriteAt {
    tag: &'static str,
    nth: usize,
    seen: usize,
    text: &'static str,
}

impl ParseListener for WriteAt {
    fn element_pushed(
        &mut self,
        cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        if name == self.tag {
            if self.seen == self.nth {
                cx.document_write(self.text);
            }
            self.seen += 1;
        }
        Ok(())
    }
}

#[test]
fn listener_writes_splice_at_the_token_boundary() {
    for (tag, count) in [("div", 1), ("p", 2), ("b", 1), ("li", 2)] {
        for nth in 0..count {
            let at = after_start_tag(SOURCE, tag, nth);
            let inline = format!("{}{SNIPPET}{}", &SOURCE[..at], &SOURCE[at..]);
            let expected = parse_static(&inline);

            let mut dom = Dom::new();
            let listener = WriteAt {
                tag,
                nth,
                seen: 0,
                text: SNIPPET,
            };
            let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), listener);
            parser
                .parse(&mut dom, SOURCE, ParseContext::Document)
                .expect("scripted parse");
            assert_same_document(&expected, &dom);
        }
    }
}

#[test]
fn writes_from_implied_element_pushes_land_after_the_text_run() {
    // A text run implies html, head and body; the write belongs right after
    // that run, ahead of the tag that ends it.
    for tag in ["html", "body"] {
        let expected = parse_static("xW<p>y");
        let mut dom = Dom::new();
        let listener = WriteAt {
            tag,
            nth: 0,
            seen: 0,
            text: "W",
        };
        let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), listener);
        parser
            .parse(&mut dom, "x<p>y", ParseContext::Document)
            .expect("scripted parse");
        assert_same_document(&expected, &dom);
    }
}

#[test]
fn suspension_from_an_implied_push_stops_before_the_next_tag() {
    struct SuspendOnBody;
    impl ParseListener for SuspendOnBody {
        fn element_pushed(
            &mut self,
            cx: &mut ListenerContext<'_>,
            _ns: Namespace,
            name: &str,
            _node: NodeKey,
        ) -> Result<(), ListenerError> {
            if name == "body" {
                cx.suspend();
            }
            Ok(())
        }
    }

    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), SuspendOnBody);
    assert_eq!(
        parser
            .parse(&mut dom, "x<p>y", ParseContext::Document)
            .expect("parse"),
        PumpOutcome::Suspended
    );
    let body = DomSnapshot::of_document(&dom).as_lines().to_vec();
    assert!(
        !body.iter().any(|line| line.trim() == "<p>"),
        "p must not be built before the suspension: {body:?}"
    );
    parser.document_write("W").expect("host write");
    assert_eq!(parser.pump(&mut dom).expect("resume"), PumpOutcome::Finished);
    assert_same_document(&parse_static("xW<p>y"), &dom);
}

/// Suspends on every pushed element and records every event kind.
#[derive(Default)]
struct Stepper {
    events: Vec<&'static str>,
    end_documents: usize,
}

impl ParseListener for Stepper {
    fn element_pushed(
        &mut self,
        cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        _name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        self.events.push("push");
        cx.suspend();
        Ok(())
    }

    fn element_popped(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        _name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        self.events.push("pop");
        Ok(())
    }

    fn end_tag(&mut self, _cx: &mut ListenerContext<'_>, _node: NodeKey) -> Result<(), ListenerError> {
        self.events.push("end_tag");
        Ok(())
    }

    fn append_characters(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _parent: NodeKey,
        text: String,
    ) -> Result<String, ListenerError> {
        self.events.push("text");
        Ok(text)
    }

    fn end_document(&mut self, _dom: &Dom) {
        self.end_documents += 1;
    }
}

#[test]
fn suspending_at_every_element_changes_nothing() {
    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), Stepper::default());
    let mut outcome = parser
        .parse(&mut dom, SOURCE, ParseContext::Document)
        .expect("parse");
    let mut resumes = 0;
    while outcome == PumpOutcome::Suspended {
        resumes += 1;
        outcome = parser.pump(&mut dom).expect("resume");
    }
    let pushes = parser
        .listener()
        .events
        .iter()
        .filter(|event| **event == "push")
        .count();
    // Implied html/head/body are pushed by one token and share a suspension.
    assert!(resumes > 0 && resumes <= pushes, "{resumes} resumes, {pushes} pushes");
    assert_eq!(parser.counters().suspensions, resumes as u64);
    assert_eq!(parser.listener().end_documents, 1);
    assert_same_document(&parse_static(SOURCE), &dom);
}

#[test]
fn character_appends_are_separated_by_structure() {
    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), Stepper::default());
    let mut outcome = parser
        .parse(&mut dom, "a<b>b</b>c&amp;d<br>e<p>f", ParseContext::Document)
        .expect("parse");
    while outcome == PumpOutcome::Suspended {
        parser.document_write("w").expect("write at suspension");
        outcome = parser.pump(&mut dom).expect("resume");
    }
    let events = &parser.listener().events;
    for pair in events.windows(2) {
        assert!(
            pair != ["text", "text"],
            "adjacent text appends in {events:?}"
        );
    }
}

#[test]
fn end_document_fires_once_even_when_a_hook_fails() {
    struct FailOnB {
        end_documents: usize,
    }
    impl ParseListener for FailOnB {
        fn element_pushed(
            &mut self,
            _cx: &mut ListenerContext<'_>,
            _ns: Namespace,
            name: &str,
            _node: NodeKey,
        ) -> Result<(), ListenerError> {
            if name == "b" {
                return Err(ListenerError::new("b is not allowed"));
            }
            Ok(())
        }

        fn end_document(&mut self, _dom: &Dom) {
            self.end_documents += 1;
        }
    }

    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), FailOnB { end_documents: 0 });
    let err = parser
        .parse(&mut dom, SOURCE, ParseContext::Document)
        .expect_err("hook failure is fatal");
    assert!(matches!(err, DriverError::Tree(_)));
    assert!(matches!(parser.pump(&mut dom), Err(DriverError::InactiveSession)));
    assert_eq!(parser.into_listener().end_documents, 1);
}

#[test]
fn self_reinjecting_script_times_out() {
    struct Reinject;
    impl ParseListener for Reinject {
        fn element_pushed(
            &mut self,
            cx: &mut ListenerContext<'_>,
            _ns: Namespace,
            name: &str,
            _node: NodeKey,
        ) -> Result<(), ListenerError> {
            if name == "div" {
                cx.document_write("<div></div>");
            }
            Ok(())
        }
    }

    let config = DriverConfig {
        pump_time_budget: Duration::from_millis(50),
        ..DriverConfig::default()
    };
    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(config, Reinject);
    let err = parser
        .parse(&mut dom, "<div></div>", ParseContext::Document)
        .expect_err("watchdog must fire");
    assert!(
        err.to_string().starts_with("pump exceeded time budget"),
        "{err}"
    );
    assert!(!parser.is_active());
}

#[test]
fn interrupt_from_another_thread_stops_the_next_pump() {
    struct SuspendOnP;
    impl ParseListener for SuspendOnP {
        fn element_pushed(
            &mut self,
            cx: &mut ListenerContext<'_>,
            _ns: Namespace,
            name: &str,
            _node: NodeKey,
        ) -> Result<(), ListenerError> {
            if name == "p" {
                cx.suspend();
            }
            Ok(())
        }
    }

    let mut dom = Dom::new();
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), SuspendOnP);
    assert_eq!(
        parser
            .parse(&mut dom, "<p>a", ParseContext::Document)
            .expect("parse"),
        PumpOutcome::Suspended
    );
    let handle = parser.interrupt_handle();
    std::thread::spawn(move || handle.interrupt())
        .join()
        .expect("interrupt thread");
    assert!(matches!(parser.pump(&mut dom), Err(DriverError::Interrupted)));
    assert!(!parser.is_active());
}

#[test]
fn fragment_parse_leaves_no_wrapper_nodes() {
    let mut dom = Dom::new();
    let host = dom.create_element(ElementData::new(Namespace::Html, Arc::from("section"), Vec::new()));
    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), NoopListener);
    parser
        .parse(&mut dom, "<p>x</p>", ParseContext::Element(host))
        .expect("fragment parse");
    assert_eq!(dom.children(host).len(), 1);
    assert_eq!(
        DomSnapshot::new(&dom, host, DomSnapshotOptions::default()).as_lines(),
        ["<section>", "  <p>", "    \"x\""]
    );
    assert!(
        dom.children(dom.document()).is_empty(),
        "fragment parsing must not touch the document"
    );
}

#[test]
fn element_factory_is_reused_across_sessions() {
    struct Tagging;
    impl ElementFactory for Tagging {
        fn create_element(
            &mut self,
            ns: Namespace,
            name: &str,
            attributes: &[(Arc<str>, Option<String>)],
        ) -> Result<ElementData, FactoryError> {
            if name == "blink" {
                return Err(FactoryError::new("unsupported"));
            }
            let mut element = ElementData::new(ns, Arc::from(name), attributes.to_vec());
            element.host_kind = Some(Arc::from("tagged"));
            Ok(element)
        }
    }

    let mut parser = ScriptedHtmlParser::new(DriverConfig::default(), NoopListener)
        .with_element_factory(Tagging);
    for _ in 0..2 {
        let mut dom = Dom::new();
        parser
            .parse(&mut dom, "<p>a</p><blink>b</blink>", ParseContext::Document)
            .expect("parse");
        let body_lines = DomSnapshot::of_document(&dom).as_lines()[3..].to_vec();
        assert_eq!(
            body_lines,
            [
                "    <body host=tagged>",
                "      <p host=tagged>",
                "        \"a\"",
                "      <blink>",
                "        \"b\"",
            ]
        );
    }
}
