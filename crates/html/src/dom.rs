//! Arena DOM targeted by the HTML5 tree builder.
//!
//! Nodes live in a flat arena owned by [`Dom`] and are addressed by
//! [`NodeKey`] handles. The tree builder only ever holds keys, so listener
//! callbacks can be handed a shared `&Dom` while parsing is in progress.
//!
//! Invariants:
//! - `NodeKey` values are non-zero and only meaningful for the `Dom` that
//!   produced them (`Dom::id` identifies the instance).
//! - A node has at most one parent and appears at most once in that parent's
//!   child list.
//! - Child ordering is explicit and deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable node identity within one [`Dom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeKey = NodeKey(0);

    fn index(self) -> usize {
        debug_assert!(self != NodeKey::INVALID, "NodeKey::INVALID used as handle");
        (self.0 as usize).wrapping_sub(1)
    }

    fn from_index(index: usize) -> Self {
        NodeKey(index as u32 + 1)
    }
}

/// Element namespaces the tree builder distinguishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn url(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }

    pub fn from_url(url: &str) -> Option<Self> {
        match url {
            "http://www.w3.org/1999/xhtml" => Some(Namespace::Html),
            "http://www.w3.org/2000/svg" => Some(Namespace::Svg),
            "http://www.w3.org/1998/Math/MathML" => Some(Namespace::MathMl),
            _ => None,
        }
    }
}

/// Element payload.
///
/// Names are canonical ASCII-lowercase. Attribute order and duplicates are
/// preserved exactly as the tokenizer delivered them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub ns: Namespace,
    pub name: Arc<str>,
    pub attributes: Vec<(Arc<str>, Option<String>)>,
    /// Host-specific element kind chosen by an element factory, if any.
    pub host_kind: Option<Arc<str>>,
}

impl ElementData {
    pub fn new(ns: Namespace, name: Arc<str>, attributes: Vec<(Arc<str>, Option<String>)>) -> Self {
        Self {
            ns,
            name,
            attributes,
            host_kind: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn is_html(&self, name: &str) -> bool {
        self.ns == Namespace::Html && self.name.as_ref() == name
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Document,
    DocumentFragment,
    Doctype {
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeData {
    fn can_have_children(&self) -> bool {
        matches!(
            self,
            NodeData::Document | NodeData::DocumentFragment | NodeData::Element(_)
        )
    }
}

#[derive(Debug)]
struct DomNode {
    data: NodeData,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

/// Arena-backed document tree.
#[derive(Debug)]
pub struct Dom {
    id: u64,
    nodes: Vec<DomNode>,
    document: NodeKey,
}

impl Dom {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let mut dom = Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            document: NodeKey::INVALID,
        };
        dom.document = dom.push(NodeData::Document);
        dom
    }

    /// Opaque identity for this arena instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn document(&self) -> NodeKey {
        self.document
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        key != NodeKey::INVALID && key.index() < self.nodes.len()
    }

    fn push(&mut self, data: NodeData) -> NodeKey {
        let key = NodeKey::from_index(self.nodes.len());
        self.nodes.push(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        key
    }

    fn node(&self, key: NodeKey) -> &DomNode {
        &self.nodes[key.index()]
    }

    fn node_mut(&mut self, key: NodeKey) -> &mut DomNode {
        &mut self.nodes[key.index()]
    }

    pub fn create_element(&mut self, element: ElementData) -> NodeKey {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeKey {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(
        &mut self,
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    ) -> NodeKey {
        self.push(NodeData::Doctype {
            name,
            public_id,
            system_id,
        })
    }

    pub fn create_fragment(&mut self) -> NodeKey {
        self.push(NodeData::DocumentFragment)
    }

    pub fn get(&self, key: NodeKey) -> Option<&NodeData> {
        self.contains(key).then(|| &self.node(key).data)
    }

    pub fn element(&self, key: NodeKey) -> Option<&ElementData> {
        match self.get(key)? {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, key: NodeKey) -> Option<&mut ElementData> {
        if !self.contains(key) {
            return None;
        }
        match &mut self.node_mut(key).data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.contains(key).then(|| self.node(key).parent).flatten()
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        if !self.contains(key) {
            return &[];
        }
        &self.node(key).children
    }

    pub fn last_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.children(key).last().copied()
    }

    /// Element children only, in document order.
    pub fn element_children(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.children(key)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Concatenated text of all descendant text nodes, in document order.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        let mut stack = vec![key];
        while let Some(next) = stack.pop() {
            if let Some(NodeData::Text(text)) = self.get(next) {
                out.push_str(text);
            }
            for child in self.children(next).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Remove `child` from its current parent, if any.
    pub fn detach(&mut self, child: NodeKey) {
        let Some(parent) = self.node_mut(child).parent.take() else {
            return;
        };
        let siblings = &mut self.node_mut(parent).children;
        if let Some(pos) = siblings.iter().position(|k| *k == child) {
            siblings.remove(pos);
        }
    }

    /// Append `child` to the end of `parent`'s children, moving it if needed.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) {
        debug_assert!(self.node(parent).data.can_have_children());
        debug_assert_ne!(parent, child, "node cannot be its own parent");
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert `child` into `parent` immediately before `before`.
    ///
    /// Falls back to appending when `before` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeKey, child: NodeKey, before: NodeKey) {
        debug_assert!(self.node(parent).data.can_have_children());
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        let siblings = &mut self.node_mut(parent).children;
        match siblings.iter().position(|k| *k == before) {
            Some(pos) => siblings.insert(pos, child),
            None => siblings.push(child),
        }
    }

    /// Append text to `parent`, extending a trailing text node when present.
    ///
    /// Returns the text node that received the data.
    pub fn append_text(&mut self, parent: NodeKey, text: &str) -> NodeKey {
        if let Some(last) = self.last_child(parent)
            && let NodeData::Text(existing) = &mut self.node_mut(last).data
        {
            existing.push_str(text);
            return last;
        }
        let node = self.create_text(text);
        self.append_child(parent, node);
        node
    }

    /// Insert text before `before`, extending the preceding text sibling when present.
    pub fn insert_text_before(&mut self, parent: NodeKey, before: NodeKey, text: &str) -> NodeKey {
        let siblings = self.children(parent);
        let previous = siblings
            .iter()
            .position(|k| *k == before)
            .and_then(|pos| pos.checked_sub(1))
            .map(|pos| siblings[pos]);
        if let Some(previous) = previous
            && let NodeData::Text(existing) = &mut self.node_mut(previous).data
        {
            existing.push_str(text);
            return previous;
        }
        let node = self.create_text(text);
        self.insert_before(parent, node, before);
        node
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn reparent_children(&mut self, from: NodeKey, to: NodeKey) {
        let children = std::mem::take(&mut self.node_mut(from).children);
        for child in children {
            self.node_mut(child).parent = None;
            self.append_child(to, child);
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Dom, ElementData, Namespace, NodeData, NodeKey};
    use std::sync::Arc;

    fn div(dom: &mut Dom) -> NodeKey {
        dom.create_element(ElementData::new(
            Namespace::Html,
            Arc::from("div"),
            Vec::new(),
        ))
    }

    #[test]
    fn append_text_extends_trailing_text_node() {
        let mut dom = Dom::new();
        let parent = div(&mut dom);
        let first = dom.append_text(parent, "a");
        let second = dom.append_text(parent, "b");
        assert_eq!(first, second);
        assert_eq!(dom.children(parent).len(), 1);
        assert_eq!(dom.text_content(parent), "ab");
    }

    #[test]
    fn insert_text_before_merges_with_previous_sibling() {
        let mut dom = Dom::new();
        let body = div(&mut dom);
        let table = div(&mut dom);
        dom.append_child(body, table);
        dom.insert_text_before(body, table, "x");
        dom.insert_text_before(body, table, "y");
        assert_eq!(dom.children(body).len(), 2);
        assert_eq!(
            dom.get(dom.children(body)[0]),
            Some(&NodeData::Text("xy".to_string()))
        );
    }

    #[test]
    fn append_child_moves_node_between_parents() {
        let mut dom = Dom::new();
        let a = div(&mut dom);
        let b = div(&mut dom);
        let child = div(&mut dom);
        dom.append_child(a, child);
        dom.append_child(b, child);
        assert!(dom.children(a).is_empty());
        assert_eq!(dom.children(b), &[child]);
        assert_eq!(dom.parent(child), Some(b));
    }

    #[test]
    fn reparent_children_preserves_order() {
        let mut dom = Dom::new();
        let from = div(&mut dom);
        let to = div(&mut dom);
        let one = dom.create_text("1");
        let two = dom.create_comment("2");
        dom.append_child(from, one);
        dom.append_child(from, two);
        dom.reparent_children(from, to);
        assert!(dom.children(from).is_empty());
        assert_eq!(dom.children(to), &[one, two]);
        assert_eq!(dom.parent(two), Some(to));
    }

    #[test]
    fn invalid_keys_are_rejected_by_lookups() {
        let dom = Dom::new();
        assert!(dom.get(NodeKey::INVALID).is_none());
        assert!(dom.get(NodeKey(999)).is_none());
        assert!(dom.children(NodeKey(999)).is_empty());
    }

    #[test]
    fn namespace_urls_round_trip() {
        for ns in [Namespace::Html, Namespace::Svg, Namespace::MathMl] {
            assert_eq!(Namespace::from_url(ns.url()), Some(ns));
        }
    }
}
