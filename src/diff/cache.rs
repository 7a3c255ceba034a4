//! Carry-forward cache of last-known structure state
//!
//! The tracer does not re-emit every live structure on every step. When a
//! frame omits a structure the viewer keeps showing its last non-empty state
//! instead of flashing it empty. The cache is fed frames in increasing index
//! order only; walking backward never removes anything.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::snapshot::{Frame, Scalar, StructureKind, StructureSnapshot, TreeNode};

/// `(kind, name) → last non-empty snapshot`, scoped to one trace session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarryForwardCache {
    entries: FxHashMap<(StructureKind, String), StructureSnapshot>,
    /// First-seen order of names, so carried structures render in a stable order
    order: Vec<(StructureKind, String)>,
}

impl CarryForwardCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` under its kind and `name`, unless it is empty
    pub fn update(&mut self, name: &str, snapshot: StructureSnapshot) {
        if snapshot.is_empty() {
            return;
        }
        let key = (snapshot.kind(), name.to_string());
        if !self.entries.contains_key(&key) {
            trace!(kind = %key.0, name, "caching new structure");
            self.order.push(key.clone());
        }
        self.entries.insert(key, snapshot);
    }

    /// The current snapshot if non-empty, else the cached one, else the empty default
    pub fn resolve(
        &self,
        kind: StructureKind,
        name: &str,
        current: Option<&StructureSnapshot>,
    ) -> StructureSnapshot {
        if let Some(snapshot) = current.filter(|s| s.kind() == kind && !s.is_empty()) {
            return snapshot.clone();
        }
        self.get(kind, name)
            .cloned()
            .unwrap_or_else(|| StructureSnapshot::empty(kind))
    }

    /// Borrowing form of [`resolve`](Self::resolve) for arrays and linked lists
    pub fn resolve_sequence<'a>(
        &'a self,
        kind: StructureKind,
        name: &str,
        current: Option<&'a [Scalar]>,
    ) -> &'a [Scalar] {
        match current {
            Some(values) if !values.is_empty() => values,
            _ => self
                .get(kind, name)
                .and_then(StructureSnapshot::as_sequence)
                .unwrap_or(&[]),
        }
    }

    /// Borrowing form of [`resolve`](Self::resolve) for trees
    pub fn resolve_tree<'a>(
        &'a self,
        name: &str,
        current: Option<&'a TreeNode>,
    ) -> Option<&'a TreeNode> {
        current.or_else(|| {
            self.get(StructureKind::Tree, name)
                .and_then(StructureSnapshot::as_tree)
        })
    }

    pub fn get(&self, kind: StructureKind, name: &str) -> Option<&StructureSnapshot> {
        self.entries.get(&(kind, name.to_string()))
    }

    /// Cached names of one kind, in first-seen order
    pub fn names(&self, kind: StructureKind) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }

    /// Fold one frame into the cache: every array, linked list and tree it carries.
    /// Dicts are always re-emitted by the tracer and are not carried forward.
    pub fn observe(&mut self, frame: &Frame) {
        for (name, values) in &frame.arrays {
            self.update(name, StructureSnapshot::Array(values.clone()));
        }
        for (name, values) in &frame.linked_lists {
            self.update(name, StructureSnapshot::LinkedList(values.clone()));
        }
        for (name, root) in &frame.trees {
            self.update(name, StructureSnapshot::Tree(root.clone()));
        }
        trace!(entries = self.entries.len(), "observed frame into carry-forward cache");
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
