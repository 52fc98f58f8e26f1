//! Stack of open elements helpers.

use crate::dom::{Namespace, NodeKey};
use crate::html5::shared::{AtomId, AtomTable};

/// Entry in the stack of open elements.
///
/// Identity is arena-handle based (`NodeKey`) and atom-name based (`AtomId`);
/// no DOM lookups are required to answer scope queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OpenElement {
    pub(crate) key: NodeKey,
    pub(crate) name: AtomId,
    pub(crate) ns: Namespace,
}

impl OpenElement {
    pub(crate) fn new(key: NodeKey, name: AtomId, ns: Namespace) -> Self {
        Self { key, name, ns }
    }

    pub(crate) fn is_html(self, name: AtomId) -> bool {
        self.ns == Namespace::Html && self.name == name
    }
}

/// Scope classes used by end-tag handling.
///
/// Scope flavor is chosen by the caller algorithm context (for example, an
/// InBody end-tag path), not as a universal property of a tag name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    /// HTML "in scope" baseline.
    InScope,
    /// HTML "in button scope".
    Button,
    /// HTML "in list-item scope".
    ListItem,
}

/// Atom IDs used to evaluate scope boundaries.
///
/// Core v0 note: the boundary set only covers HTML-namespace elements; foreign
/// integration points are not boundaries yet.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScopeTagSet {
    pub(crate) html: AtomId,
    pub(crate) table: AtomId,
    pub(crate) template: AtomId,
    pub(crate) td: AtomId,
    pub(crate) th: AtomId,
    pub(crate) caption: AtomId,
    pub(crate) marquee: AtomId,
    pub(crate) object: AtomId,
    pub(crate) applet: AtomId,
    pub(crate) button: AtomId,
    pub(crate) ol: AtomId,
    pub(crate) ul: AtomId,
}

impl ScopeTagSet {
    pub(crate) fn intern(atoms: &mut AtomTable) -> Self {
        Self {
            html: atoms.intern_ascii_folded("html"),
            table: atoms.intern_ascii_folded("table"),
            template: atoms.intern_ascii_folded("template"),
            td: atoms.intern_ascii_folded("td"),
            th: atoms.intern_ascii_folded("th"),
            caption: atoms.intern_ascii_folded("caption"),
            marquee: atoms.intern_ascii_folded("marquee"),
            object: atoms.intern_ascii_folded("object"),
            applet: atoms.intern_ascii_folded("applet"),
            button: atoms.intern_ascii_folded("button"),
            ol: atoms.intern_ascii_folded("ol"),
            ul: atoms.intern_ascii_folded("ul"),
        }
    }
}

/// Stack of open elements with deterministic push/pop behavior.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenElementsStack {
    items: Vec<OpenElement>,
    max_depth: u32,
}

impl OpenElementsStack {
    pub(crate) fn push(&mut self, entry: OpenElement) {
        self.items.push(entry);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    pub(crate) fn current(&self) -> Option<OpenElement> {
        self.items.last().copied()
    }

    pub(crate) fn pop(&mut self) -> Option<OpenElement> {
        self.items.pop()
    }

    /// Remove `key` wherever it sits in the stack.
    pub(crate) fn remove(&mut self, key: NodeKey) -> Option<OpenElement> {
        let index = self.items.iter().rposition(|entry| entry.key == key)?;
        Some(self.items.remove(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<OpenElement> {
        self.items.get(index).copied()
    }

    pub(crate) fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Entries from the top of the stack down, with their indices.
    pub(crate) fn iter_top_down(&self) -> impl Iterator<Item = (usize, OpenElement)> + '_ {
        self.items.iter().copied().enumerate().rev()
    }

    /// Index of the topmost HTML element named `name`, ignoring scope.
    pub(crate) fn position_of(&self, name: AtomId) -> Option<usize> {
        self.items.iter().rposition(|entry| entry.is_html(name))
    }

    pub(crate) fn has_in_scope(&self, target: AtomId, kind: ScopeKind, tags: &ScopeTagSet) -> bool {
        self.find_in_scope_match_index(|name| name == target, kind, tags)
            .is_some()
    }

    /// Scope probe for a set of names (for example, any heading).
    pub(crate) fn find_any_in_scope(
        &self,
        matches: impl Fn(AtomId) -> bool,
        kind: ScopeKind,
        tags: &ScopeTagSet,
    ) -> Option<usize> {
        self.find_in_scope_match_index(matches, kind, tags)
    }

    fn find_in_scope_match_index(
        &self,
        matches: impl Fn(AtomId) -> bool,
        kind: ScopeKind,
        tags: &ScopeTagSet,
    ) -> Option<usize> {
        for (index, entry) in self.iter_top_down() {
            if entry.ns != Namespace::Html {
                continue;
            }
            if matches(entry.name) {
                return Some(index);
            }
            if is_scope_boundary(entry.name, kind, tags) {
                return None;
            }
        }
        None
    }
}

fn is_scope_boundary(name: AtomId, kind: ScopeKind, tags: &ScopeTagSet) -> bool {
    match kind {
        ScopeKind::InScope => {
            name == tags.html
                || name == tags.table
                || name == tags.template
                || name == tags.td
                || name == tags.th
                || name == tags.caption
                || name == tags.marquee
                || name == tags.object
                || name == tags.applet
        }
        ScopeKind::Button => {
            is_scope_boundary(name, ScopeKind::InScope, tags) || name == tags.button
        }
        ScopeKind::ListItem => {
            is_scope_boundary(name, ScopeKind::InScope, tags) || name == tags.ol || name == tags.ul
        }
    }
}
