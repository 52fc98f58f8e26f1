use crate::dom::{Dom, Namespace, NodeData, NodeKey};
use std::fmt::{self, Write};
use std::sync::OnceLock;

/// Deterministic DOM serialization and equality rules for driver/corpus tests
/// and the command-line dump. Not a stable format.
///
/// Equivalence rules:
/// - Node kinds must match.
/// - Element namespaces and names must match.
/// - Attribute list order is significant; names and values must match.
/// - Text nodes must match exactly (post entity decode).
/// - Comments and doctypes must match exactly.
/// - Host kinds assigned by an element factory must match.
/// - Node keys are ignored unless `ignore_ids` is off.
#[derive(Clone, Copy, Debug)]
pub struct DomSnapshotOptions {
    pub ignore_ids: bool,
}

impl Default for DomSnapshotOptions {
    fn default() -> Self {
        Self { ignore_ids: true }
    }
}

#[derive(Debug)]
pub struct DomSnapshot {
    lines: Vec<String>,
}

impl DomSnapshot {
    pub fn new(dom: &Dom, root: NodeKey, options: DomSnapshotOptions) -> Self {
        let mut lines = Vec::new();
        walk_snapshot(dom, root, &options, 0, &mut lines);
        Self { lines }
    }

    /// Snapshot of the whole document.
    pub fn of_document(dom: &Dom) -> Self {
        Self::new(dom, dom.document(), DomSnapshotOptions::default())
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for DomSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// A node together with the arena that owns it.
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    pub dom: &'a Dom,
    pub key: NodeKey,
}

impl<'a> NodeRef<'a> {
    pub fn new(dom: &'a Dom, key: NodeKey) -> Self {
        Self { dom, key }
    }

    fn data(self) -> Option<&'a NodeData> {
        self.dom.get(self.key)
    }

    fn children(self) -> impl Iterator<Item = NodeRef<'a>> {
        let dom = self.dom;
        dom.children(self.key)
            .iter()
            .map(move |key| NodeRef::new(dom, *key))
    }
}

#[derive(Debug)]
pub struct DomMismatch<'a> {
    path: String,
    detail: String,
    expected: String,
    actual: String,
    expected_node: NodeRef<'a>,
    actual_node: NodeRef<'a>,
    options: DomSnapshotOptions,
    expected_subtree: OnceLock<String>,
    actual_subtree: OnceLock<String>,
}

impl fmt::Display for DomMismatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected_subtree = self.expected_subtree.get_or_init(|| {
            DomSnapshot::new(self.expected_node.dom, self.expected_node.key, self.options).render()
        });
        let actual_subtree = self.actual_subtree.get_or_init(|| {
            DomSnapshot::new(self.actual_node.dom, self.actual_node.key, self.options).render()
        });
        writeln!(f, "DOM mismatch at {}: {}", self.path, self.detail)?;
        writeln!(f, "expected: {}", self.expected)?;
        writeln!(f, "actual:   {}", self.actual)?;
        writeln!(f, "expected subtree:\n{}", expected_subtree)?;
        writeln!(f, "actual subtree:\n{}", actual_subtree)?;
        Ok(())
    }
}

impl std::error::Error for DomMismatch<'_> {}

pub fn assert_dom_eq(expected: NodeRef<'_>, actual: NodeRef<'_>, options: DomSnapshotOptions) {
    if let Err(mismatch) = compare_dom(expected, actual, options) {
        panic!("{mismatch}");
    }
}

pub fn compare_dom<'a>(
    expected: NodeRef<'a>,
    actual: NodeRef<'a>,
    options: DomSnapshotOptions,
) -> Result<(), Box<DomMismatch<'a>>> {
    let mut path = vec![node_label(expected)];
    compare_nodes(expected, actual, &options, &mut path)
}

fn compare_nodes<'a>(
    expected: NodeRef<'a>,
    actual: NodeRef<'a>,
    options: &DomSnapshotOptions,
    path: &mut Vec<String>,
) -> Result<(), Box<DomMismatch<'a>>> {
    if !options.ignore_ids && expected.key != actual.key {
        return Err(Box::new(mismatch(path, "node key", expected, actual, options)));
    }
    match (expected.data(), actual.data()) {
        (Some(NodeData::Document), Some(NodeData::Document))
        | (Some(NodeData::DocumentFragment), Some(NodeData::DocumentFragment)) => {
            compare_children(expected, actual, options, path)
        }
        (Some(exp @ NodeData::Doctype { .. }), Some(act @ NodeData::Doctype { .. })) => {
            if exp != act {
                return Err(Box::new(mismatch(path, "doctype", expected, actual, options)));
            }
            Ok(())
        }
        (Some(NodeData::Element(exp)), Some(NodeData::Element(act))) => {
            if exp.ns != act.ns {
                return Err(Box::new(mismatch(
                    path,
                    "element namespace",
                    expected,
                    actual,
                    options,
                )));
            }
            if exp.name != act.name {
                return Err(Box::new(mismatch(
                    path,
                    "element name",
                    expected,
                    actual,
                    options,
                )));
            }
            if exp.attributes.len() != act.attributes.len() {
                return Err(Box::new(mismatch(
                    path,
                    "attribute count",
                    expected,
                    actual,
                    options,
                )));
            }
            for (i, (e, a)) in exp.attributes.iter().zip(act.attributes.iter()).enumerate() {
                if e.0 != a.0 {
                    return Err(Box::new(mismatch(
                        path,
                        &format!("attribute name at index {i}"),
                        expected,
                        actual,
                        options,
                    )));
                }
                if e.1 != a.1 {
                    return Err(Box::new(mismatch(
                        path,
                        &format!("attribute value at index {i}"),
                        expected,
                        actual,
                        options,
                    )));
                }
            }
            if exp.host_kind != act.host_kind {
                return Err(Box::new(mismatch(
                    path,
                    "host kind",
                    expected,
                    actual,
                    options,
                )));
            }
            compare_children(expected, actual, options, path)
        }
        (Some(NodeData::Text(exp)), Some(NodeData::Text(act))) => {
            if exp != act {
                return Err(Box::new(mismatch(path, "text", expected, actual, options)));
            }
            Ok(())
        }
        (Some(NodeData::Comment(exp)), Some(NodeData::Comment(act))) => {
            if exp != act {
                return Err(Box::new(mismatch(path, "comment", expected, actual, options)));
            }
            Ok(())
        }
        _ => Err(Box::new(mismatch(
            path,
            "node kind",
            expected,
            actual,
            options,
        ))),
    }
}

fn compare_children<'a>(
    expected_parent: NodeRef<'a>,
    actual_parent: NodeRef<'a>,
    options: &DomSnapshotOptions,
    path: &mut Vec<String>,
) -> Result<(), Box<DomMismatch<'a>>> {
    let expected_len = expected_parent.dom.children(expected_parent.key).len();
    let actual_len = actual_parent.dom.children(actual_parent.key).len();
    if expected_len != actual_len {
        return Err(Box::new(mismatch(
            path,
            &format!("child count (expected {expected_len}, actual {actual_len})"),
            expected_parent,
            actual_parent,
            options,
        )));
    }
    for (idx, (exp, act)) in expected_parent
        .children()
        .zip(actual_parent.children())
        .enumerate()
    {
        path.push(format!("{}[{}]", node_label(exp), idx));
        let result = compare_nodes(exp, act, options, path);
        path.pop();
        result?;
    }
    Ok(())
}

fn mismatch<'a>(
    path: &[String],
    detail: &str,
    expected: NodeRef<'a>,
    actual: NodeRef<'a>,
    options: &DomSnapshotOptions,
) -> DomMismatch<'a> {
    let path = format!("/{}", path.join("/"));
    let expected_line = format_node_line(expected, options);
    let actual_line = format_node_line(actual, options);
    DomMismatch {
        path,
        detail: detail.to_string(),
        expected: truncate_line(expected_line, 160),
        actual: truncate_line(actual_line, 160),
        expected_node: expected,
        actual_node: actual,
        options: *options,
        expected_subtree: OnceLock::new(),
        actual_subtree: OnceLock::new(),
    }
}

fn node_label(node: NodeRef<'_>) -> String {
    match node.data() {
        Some(NodeData::Document) => "#document".to_string(),
        Some(NodeData::DocumentFragment) => "#fragment".to_string(),
        Some(NodeData::Doctype { .. }) => "#doctype".to_string(),
        Some(NodeData::Element(element)) => {
            let mut label = String::from(element.name.as_ref());
            let id_attr = element.attr("id").filter(|value| !value.is_empty());
            let class_attr = element.attr("class").filter(|value| !value.is_empty());
            if let Some(id_value) = id_attr {
                label.push('#');
                write_escaped(&mut label, id_value);
            } else if let Some(class_value) = class_attr {
                label.push_str(".class=");
                write_escaped(&mut label, class_value);
            }
            label
        }
        Some(NodeData::Text(_)) => "#text".to_string(),
        Some(NodeData::Comment(_)) => "#comment".to_string(),
        None => "#missing".to_string(),
    }
}

fn truncate_line(mut line: String, max_len: usize) -> String {
    if line.len() > max_len {
        let mut cut = max_len.saturating_sub(3);
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
        line.push_str("...");
    }
    line
}

fn walk_snapshot(
    dom: &Dom,
    key: NodeKey,
    options: &DomSnapshotOptions,
    indent_level: usize,
    out: &mut Vec<String>,
) {
    const INDENT_STEP: usize = 2;
    let mut line = " ".repeat(indent_level.saturating_mul(INDENT_STEP));
    write_node_line(&mut line, NodeRef::new(dom, key), options);
    out.push(line);
    for child in dom.children(key) {
        walk_snapshot(dom, *child, options, indent_level + 1, out);
    }
}

fn format_node_line(node: NodeRef<'_>, options: &DomSnapshotOptions) -> String {
    let mut line = String::new();
    write_node_line(&mut line, node, options);
    line
}

fn write_node_line(out: &mut String, node: NodeRef<'_>, options: &DomSnapshotOptions) {
    match node.data() {
        Some(NodeData::Document) => out.push_str("#document"),
        Some(NodeData::DocumentFragment) => out.push_str("#fragment"),
        Some(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }) => {
            out.push_str("<!DOCTYPE");
            if let Some(name) = name {
                out.push(' ');
                write_escaped(out, name);
            }
            if public_id.is_some() || system_id.is_some() {
                for id in [public_id, system_id] {
                    out.push_str(" \"");
                    write_escaped(out, id.as_deref().unwrap_or(""));
                    out.push('"');
                }
            }
            out.push('>');
        }
        Some(NodeData::Element(element)) => {
            out.push('<');
            match element.ns {
                Namespace::Html => {}
                Namespace::Svg => out.push_str("svg "),
                Namespace::MathMl => out.push_str("math "),
            }
            out.push_str(&element.name);
            for (attr, value) in &element.attributes {
                out.push(' ');
                out.push_str(attr);
                if let Some(value) = value {
                    out.push('=');
                    out.push('"');
                    write_escaped(out, value);
                    out.push('"');
                }
            }
            if let Some(kind) = &element.host_kind {
                out.push_str(" host=");
                out.push_str(kind);
            }
            out.push('>');
        }
        Some(NodeData::Text(text)) => {
            out.push('"');
            write_escaped(out, text);
            out.push('"');
        }
        Some(NodeData::Comment(text)) => {
            out.push_str("<!-- ");
            write_escaped(out, text);
            out.push_str(" -->");
        }
        None => out.push_str("#missing"),
    }
    if !options.ignore_ids {
        write!(out, " @{}", node.key.0).ok();
    }
}

fn write_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ if ch.is_ascii() => out.push(ch),
            _ => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
        }
    }
}
