//! Atom table for canonicalized HTML tag/attribute names.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque atom identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Document-level atom table.
///
/// Invariant: ASCII letters are stored in canonical lowercase form for
/// HTML-namespace matching. Non-ASCII code points are preserved as-is.
#[derive(Debug)]
pub struct AtomTable {
    id: u64,
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            atoms: Vec::new(),
            map: HashMap::new(),
        }
    }

    /// Intern a name, applying ASCII-lowercase folding for HTML matching.
    pub fn intern_ascii_folded(&mut self, name: &str) -> AtomId {
        if !name.bytes().any(|b| b.is_ascii_uppercase()) {
            if let Some(id) = self.map.get(name) {
                return *id;
            }
            return self.insert(Arc::from(name));
        }
        let folded = name.to_ascii_lowercase();
        if let Some(id) = self.map.get(folded.as_str()) {
            return *id;
        }
        self.insert(Arc::from(folded))
    }

    /// Look up an already interned name without inserting it.
    pub fn get(&self, name: &str) -> Option<AtomId> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            return self.map.get(name.to_ascii_lowercase().as_str()).copied();
        }
        self.map.get(name).copied()
    }

    fn insert(&mut self, atom: Arc<str>) -> AtomId {
        // u32 ids: a document would need four billion distinct names first.
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    pub fn resolve(&self, id: AtomId) -> Option<&str> {
        self.atoms.get(id.0 as usize).map(|s| s.as_ref())
    }

    /// Resolve an atom id to a cloned canonical `Arc<str>`.
    ///
    /// Lets element and attribute names flow into the DOM without
    /// reallocating the interned string.
    pub fn resolve_arc(&self, id: AtomId) -> Option<Arc<str>> {
        self.atoms.get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Stable per-instance identifier used to enforce document-level binding
    /// invariants across tokenizer/tree-builder components.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}
