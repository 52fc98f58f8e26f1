use super::{
    BuildTarget, ElementFactory, FactoryError, Html5TreeBuilder, ListenerContext, ListenerError,
    NoopListener, ParseListener, TreeBuilderConfig, TreeBuilderError, TreeHost, TreeSink,
};
use crate::dom::{Dom, ElementData, Namespace, NodeKey};
use crate::dom_snapshot::DomSnapshot;
use crate::html5::driver::{ParserControl, WritePolicy};
use crate::html5::shared::{DocumentParseContext, InputChunk, ParseErrorCode};
use crate::html5::tokenizer::{Html5Tokenizer, TokenizeResult, TokenizerConfig};
use std::sync::Arc;

#[derive(Clone, Copy)]
enum Target {
    Document,
    Fragment(Namespace, &'static str),
}

struct Parsed {
    dom: Dom,
    ctx: DocumentParseContext,
    root: NodeKey,
    max_depth: u32,
}

impl Parsed {
    fn lines(&self) -> Vec<String> {
        DomSnapshot::new(&self.dom, self.root, Default::default())
            .as_lines()
            .to_vec()
    }

    fn has_error(&self, code: ParseErrorCode) -> bool {
        self.ctx.errors.iter().any(|err| err.code == code)
    }
}

fn parse_full(
    chunks: &[&str],
    config: TreeBuilderConfig,
    target: Target,
    listener: &mut dyn ParseListener,
    mut factory: Option<&mut (dyn ElementFactory + 'static)>,
) -> Parsed {
    let mut dom = Dom::new();
    let mut ctx = DocumentParseContext::new();
    let mut control = ParserControl::new(WritePolicy::SpliceAtToken);
    control.activate();
    let (build_target, root) = match target {
        Target::Document => (BuildTarget::Document, dom.document()),
        Target::Fragment(ns, name) => {
            let into = dom.create_element(ElementData::new(ns, Arc::from(name), Vec::new()));
            let document = dom.document();
            dom.append_child(document, into);
            let build_target = BuildTarget::Fragment {
                context_ns: ns,
                context_name: Arc::from(name),
                into,
            };
            (build_target, into)
        }
    };
    let mut tokenizer = Html5Tokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut builder = Html5TreeBuilder::new(config, &mut ctx, &mut dom, build_target);
    if let Some(kind) = builder.initial_content_model()
        && let Target::Fragment(_, name) = target
    {
        tokenizer.set_initial_content_model(kind, name);
    }
    for text in chunks {
        let mut chunk = InputChunk::new(*text);
        let host = TreeHost::new(&mut dom, &mut *listener, factory.as_deref_mut(), &mut control);
        let mut sink = TreeSink::new(&mut builder, host);
        let result = tokenizer
            .tokenize_chunk(&mut chunk, &mut ctx, &mut sink)
            .expect("tree construction");
        assert_eq!(result, TokenizeResult::NeedMoreInput);
    }
    let host = TreeHost::new(&mut dom, &mut *listener, factory.as_deref_mut(), &mut control);
    let mut sink = TreeSink::new(&mut builder, host);
    let result = tokenizer.eof(&mut ctx, &mut sink).expect("tree construction at eof");
    assert_eq!(result, TokenizeResult::EmittedEof);
    assert!(builder.is_finished());
    assert_eq!(builder.open_element_count(), 0);
    assert_eq!(builder.pending_text_len(), 0);
    Parsed {
        dom,
        ctx,
        root,
        max_depth: builder.max_open_depth(),
    }
}

fn parse(input: &str) -> Parsed {
    parse_full(
        &[input],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut NoopListener,
        None,
    )
}

fn parse_fragment(ns: Namespace, context: &'static str, input: &str) -> Parsed {
    parse_full(
        &[input],
        TreeBuilderConfig::default(),
        Target::Fragment(ns, context),
        &mut NoopListener,
        None,
    )
}

fn name_of(dom: &Dom, node: NodeKey) -> String {
    dom.element(node)
        .map(|element| element.name.to_string())
        .unwrap_or_else(|| format!("#{}", node.0))
}

/// Records every listener event as a line.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ParseListener for Recorder {
    fn element_pushed(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        self.events.push(format!("push {name}"));
        Ok(())
    }

    fn element_popped(
        &mut self,
        _cx: &mut ListenerContext<'_>,
        _ns: Namespace,
        name: &str,
        _node: NodeKey,
    ) -> Result<(), ListenerError> {
        self.events.push(format!("pop {name}"));
        Ok(())
    }

    fn end_tag(&mut self, cx: &mut ListenerContext<'_>, node: NodeKey) -> Result<(), ListenerError> {
        self.events.push(format!("end_tag {}", name_of(cx.dom(), node)));
        Ok(())
    }

    fn append_characters(
        &mut self,
        cx: &mut ListenerContext<'_>,
        parent: NodeKey,
        text: String,
    ) -> Result<String, ListenerError> {
        self.events
            .push(format!("text {} {text:?}", name_of(cx.dom(), parent)));
        Ok(text)
    }
}

#[test]
fn implied_html_head_and_body() {
    let parsed = parse("<p>one<p>two");
    assert_eq!(
        parsed.lines(),
        [
            "#document",
            "  <html>",
            "    <head>",
            "    <body>",
            "      <p>",
            "        \"one\"",
            "      <p>",
            "        \"two\"",
        ]
    );
}

#[test]
fn doctype_and_leading_comment_attach_to_document() {
    let parsed = parse("<!DOCTYPE html><!--c--><title>t</title>");
    assert_eq!(
        parsed.lines(),
        [
            "#document",
            "  <!DOCTYPE html>",
            "  <!-- c -->",
            "  <html>",
            "    <head>",
            "      <title>",
            "        \"t\"",
            "    <body>",
        ]
    );
}

#[test]
fn late_doctype_is_ignored() {
    let parsed = parse("<p>x<!DOCTYPE html>");
    assert!(parsed.has_error(ParseErrorCode::MisplacedDoctype));
    assert!(!parsed.lines().iter().any(|line| line.contains("DOCTYPE")));
}

#[test]
fn raw_text_keeps_markup_as_text() {
    let parsed = parse("<title>a<b>&amp;</title><div><script>x<y</script></div>");
    assert_eq!(
        parsed.lines(),
        [
            "#document",
            "  <html>",
            "    <head>",
            "      <title>",
            "        \"a<b>&\"",
            "    <body>",
            "      <div>",
            "        <script>",
            "          \"x<y\"",
        ]
    );
}

#[test]
fn eof_inside_raw_text_closes_the_element() {
    let parsed = parse("<script>abc");
    assert!(parsed.has_error(ParseErrorCode::UnexpectedEof));
    assert_eq!(
        parsed.lines(),
        [
            "#document",
            "  <html>",
            "    <head>",
            "      <script>",
            "        \"abc\"",
            "    <body>",
        ]
    );
}

#[test]
fn list_items_and_headings_close_their_siblings() {
    let parsed = parse("<ul><li>a<li>b</ul><h1>c<h2>d");
    assert_eq!(
        parsed.lines()[4..],
        [
            "      <ul>",
            "        <li>",
            "          \"a\"",
            "        <li>",
            "          \"b\"",
            "      <h1>",
            "        \"c\"",
            "      <h2>",
            "        \"d\"",
        ]
    );
}

#[test]
fn stray_p_end_tag_inserts_empty_paragraph() {
    let parsed = parse("<div></p></div>");
    assert!(parsed.has_error(ParseErrorCode::UnexpectedEndTag));
    assert_eq!(parsed.lines()[4..], ["      <div>", "        <p>"]);
}

#[test]
fn unmatched_end_tag_is_ignored() {
    let parsed = parse("<div>a</span>b</div>");
    assert!(parsed.has_error(ParseErrorCode::UnexpectedEndTag));
    assert_eq!(parsed.lines()[4..], ["      <div>", "        \"ab\""]);
}

#[test]
fn void_elements_are_not_left_open() {
    let parsed = parse("<br><image src=x>text");
    assert_eq!(
        parsed.lines()[4..],
        ["      <br>", "      <img src=\"x\">", "      \"text\""]
    );
}

#[test]
fn repeated_body_merges_missing_attributes() {
    let parsed = parse("<body class=a><body id=b class=c>");
    assert_eq!(parsed.lines()[3], "    <body class=\"a\" id=\"b\">");
}

#[test]
fn foster_parents_content_out_of_tables() {
    let parsed = parse("<table>ab<b>c</b><tr></tr></table>");
    assert!(parsed.has_error(ParseErrorCode::FosterParentedContent));
    assert_eq!(
        parsed.lines()[4..],
        [
            "      \"ab\"",
            "      <b>",
            "        \"c\"",
            "      <table>",
            "        <tr>",
        ]
    );
}

#[test]
fn whitespace_in_tables_stays_in_place() {
    let parsed = parse("<table> </table>");
    assert!(!parsed.has_error(ParseErrorCode::FosterParentedContent));
    assert_eq!(parsed.lines()[4..], ["      <table>", "        \" \""]);
}

#[test]
fn svg_content_uses_foreign_namespace_until_breakout() {
    let parsed = parse("<svg><circle/><g>t</g><p>x");
    assert_eq!(
        parsed.lines()[4..],
        [
            "      <svg svg>",
            "        <svg circle>",
            "        <svg g>",
            "          \"t\"",
            "      <p>",
            "        \"x\"",
        ]
    );
}

#[test]
fn fragment_nodes_land_in_the_target_element() {
    let parsed = parse_fragment(Namespace::Html, "div", "<p>x</p>y");
    assert_eq!(
        parsed.lines(),
        ["<div>", "  <p>", "    \"x\"", "  \"y\""]
    );
}

#[test]
fn fragment_in_textarea_starts_in_rcdata() {
    let parsed = parse_fragment(Namespace::Html, "textarea", "<b>&amp;");
    assert_eq!(parsed.lines(), ["<textarea>", "  \"<b>&\""]);
}

#[test]
fn fragment_in_svg_context_stays_foreign() {
    let parsed = parse_fragment(Namespace::Svg, "svg", "<rect/>");
    assert_eq!(parsed.lines(), ["<svg svg>", "  <svg rect>"]);
}

#[test]
fn fragment_root_is_invisible_to_listeners() {
    let mut recorder = Recorder::default();
    parse_full(
        &["<i>x</i>"],
        TreeBuilderConfig::default(),
        Target::Fragment(Namespace::Html, "div"),
        &mut recorder,
        None,
    );
    assert_eq!(
        recorder.events,
        ["push i", "text i \"x\"", "pop i", "end_tag i"]
    );
}

#[test]
fn listener_sees_events_in_tree_order() {
    let mut recorder = Recorder::default();
    parse_full(
        &["<div>a</div>b"],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut recorder,
        None,
    );
    assert_eq!(
        recorder.events,
        [
            "push html",
            "push head",
            "pop head",
            "push body",
            "push div",
            "text div \"a\"",
            "pop div",
            "end_tag div",
            "text body \"b\"",
            "pop body",
            "pop html",
        ]
    );
}

#[test]
fn end_tag_reports_the_node_current_before_the_tag() {
    let mut recorder = Recorder::default();
    parse_full(
        &["<div><span>x</div>"],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut recorder,
        None,
    );
    let tail: Vec<&str> = recorder.events[4..8].iter().map(String::as_str).collect();
    assert_eq!(
        tail,
        ["push div", "push span", "text span \"x\"", "pop span"]
    );
    assert_eq!(recorder.events[8], "pop div");
    assert_eq!(recorder.events[9], "end_tag span");
}

#[test]
fn character_runs_are_coalesced_across_chunks() {
    let mut recorder = Recorder::default();
    let parsed = parse_full(
        &["<div>ab", "cd</div>"],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut recorder,
        None,
    );
    let texts: Vec<&str> = recorder
        .events
        .iter()
        .filter(|event| event.starts_with("text"))
        .map(String::as_str)
        .collect();
    assert_eq!(texts, ["text div \"abcd\""]);
    assert_eq!(parsed.ctx.counters.text_flushes, 1);
}

#[test]
fn disabled_coalescing_appends_every_token() {
    let mut recorder = Recorder::default();
    let config = TreeBuilderConfig {
        coalesce_text: false,
        ..TreeBuilderConfig::default()
    };
    let parsed = parse_full(&["<div>ab", "cd</div>"], config, Target::Document, &mut recorder, None);
    let texts: Vec<&str> = recorder
        .events
        .iter()
        .filter(|event| event.starts_with("text"))
        .map(String::as_str)
        .collect();
    assert_eq!(texts, ["text div \"ab\"", "text div \"cd\""]);
    assert_eq!(parsed.lines()[5], "        \"abcd\"");
}

#[test]
fn foster_parented_text_bypasses_the_listener() {
    let mut recorder = Recorder::default();
    parse_full(
        &["<table>x</table>"],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut recorder,
        None,
    );
    assert!(!recorder.events.iter().any(|event| event.starts_with("text")));
}

#[test]
fn listener_can_rewrite_or_drop_text() {
    struct Shout;
    impl ParseListener for Shout {
        fn append_characters(
            &mut self,
            _cx: &mut ListenerContext<'_>,
            _parent: NodeKey,
            text: String,
        ) -> Result<String, ListenerError> {
            if text == "drop" {
                return Ok(String::new());
            }
            Ok(text.to_uppercase())
        }
    }
    let parsed = parse_full(
        &["<p>hey</p><p>drop</p>"],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut Shout,
        None,
    );
    assert_eq!(
        parsed.lines()[4..],
        ["      <p>", "        \"HEY\"", "      <p>"]
    );
}

#[test]
fn listener_failure_aborts_tree_construction() {
    struct Refuse;
    impl ParseListener for Refuse {
        fn element_pushed(
            &mut self,
            _cx: &mut ListenerContext<'_>,
            _ns: Namespace,
            name: &str,
            _node: NodeKey,
        ) -> Result<(), ListenerError> {
            if name == "b" {
                return Err(ListenerError::new("no bold"));
            }
            Ok(())
        }
    }
    let mut dom = Dom::new();
    let mut ctx = DocumentParseContext::new();
    let mut control = ParserControl::new(WritePolicy::SpliceAtToken);
    control.activate();
    let mut tokenizer = Html5Tokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut builder = Html5TreeBuilder::new(
        TreeBuilderConfig::default(),
        &mut ctx,
        &mut dom,
        BuildTarget::Document,
    );
    let mut listener = Refuse;
    let host = TreeHost::new(&mut dom, &mut listener, None, &mut control);
    let mut sink = TreeSink::new(&mut builder, host);
    let mut chunk = InputChunk::new("<p><b>x");
    let err = tokenizer
        .tokenize_chunk(&mut chunk, &mut ctx, &mut sink)
        .expect_err("listener error must surface");
    match err {
        TreeBuilderError::Listener(err) => assert_eq!(err.message(), "no bold"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn pending_writes_pause_tokenization_after_the_token() {
    struct WriteOnDiv;
    impl ParseListener for WriteOnDiv {
        fn element_pushed(
            &mut self,
            cx: &mut ListenerContext<'_>,
            _ns: Namespace,
            name: &str,
            _node: NodeKey,
        ) -> Result<(), ListenerError> {
            if name == "div" {
                cx.document_write("b");
            }
            Ok(())
        }
    }

    for (policy, expected, remaining) in [
        (WritePolicy::SpliceAtToken, TokenizeResult::Suspended, "a"),
        (WritePolicy::Deferred, TokenizeResult::NeedMoreInput, ""),
    ] {
        let mut dom = Dom::new();
        let mut ctx = DocumentParseContext::new();
        let mut control = ParserControl::new(policy);
        control.activate();
        let mut tokenizer = Html5Tokenizer::new(TokenizerConfig::default(), &mut ctx);
        let mut builder = Html5TreeBuilder::new(
            TreeBuilderConfig::default(),
            &mut ctx,
            &mut dom,
            BuildTarget::Document,
        );
        let mut listener = WriteOnDiv;
        let mut chunk = InputChunk::new("<div>a");
        let host = TreeHost::new(&mut dom, &mut listener, None, &mut control);
        let mut sink = TreeSink::new(&mut builder, host);
        let result = tokenizer
            .tokenize_chunk(&mut chunk, &mut ctx, &mut sink)
            .expect("tree construction");
        assert_eq!(result, expected, "{policy:?}");
        assert_eq!(chunk.remaining(), remaining, "{policy:?}");
        assert_eq!(control.pending_write_len(), 1, "{policy:?}");
    }
}

struct HostFactory;

impl ElementFactory for HostFactory {
    fn create_element(
        &mut self,
        ns: Namespace,
        name: &str,
        attributes: &[(Arc<str>, Option<String>)],
    ) -> Result<ElementData, FactoryError> {
        match name {
            "span" => Err(FactoryError::new("no spans here")),
            "p" => Ok(ElementData::new(ns, Arc::from("div"), attributes.to_vec())),
            _ => {
                let mut element = ElementData::new(ns, Arc::from(name), attributes.to_vec());
                element.host_kind = Some(Arc::from(format!("host-{name}")));
                Ok(element)
            }
        }
    }
}

#[test]
fn element_factory_output_is_used_when_consistent() {
    let mut factory = HostFactory;
    let parsed = parse_full(
        &["<div id=a><span></span><p></p></div>"],
        TreeBuilderConfig::default(),
        Target::Document,
        &mut NoopListener,
        Some(&mut factory),
    );
    assert_eq!(
        parsed.lines(),
        [
            "#document",
            "  <html host=host-html>",
            "    <head host=host-head>",
            "    <body host=host-body>",
            "      <div id=\"a\" host=host-div>",
            "        <span>",
            "        <p>",
        ]
    );
}

#[test]
fn stack_depth_is_tracked() {
    let parsed = parse("<div><div><div></div></div></div>");
    assert_eq!(parsed.max_depth, 5);
}

#[test]
fn noscript_is_raw_text_only_with_scripting() {
    let scripted = parse("<body><noscript><b>x</b></noscript>");
    assert_eq!(scripted.lines()[5], "        \"<b>x</b>\"");

    let config = TreeBuilderConfig {
        scripting_enabled: false,
        ..TreeBuilderConfig::default()
    };
    let plain = parse_full(
        &["<body><noscript><b>x</b></noscript>"],
        config,
        Target::Document,
        &mut NoopListener,
        None,
    );
    assert_eq!(plain.lines()[5], "        <b>");
}
