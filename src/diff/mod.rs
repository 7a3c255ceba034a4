//! Structural diffing between consecutive frames
//!
//! Every function here is pure: given the same `(current, previous, cache)`
//! it returns the same answer, and with no previous frame (index 0) it
//! reports nothing as changed.
//!
//! - [`diff_arrays`] / [`diff_linked_lists`]: growth is the only signal. When
//!   a sequence got longer, its last index is the inserted one. Shrinking,
//!   swapping and in-place writes are left to the renderer's own keyed
//!   animation.
//! - [`diff_tree`]: node ids present now but not in the previous frame.
//! - [`diff_detached_nodes`]: named nodes that are new this step and not yet
//!   linked into the main tree.
//! - [`dedup_self_alias`]: drops a `self` entry that only repeats another
//!   entry's head.
//!
//! Trees compare by id; arrays and lists by position and length. Values are
//! never compared, since programs legitimately repeat them.

pub mod cache;
pub mod view;

use indexmap::IndexMap;

use crate::snapshot::{
    collect_ids, contains_id, tree::id_set, Frame, NodeId, Scalar, StructureKind, TreeNode,
    MAIN_TREE, SELF_ALIAS,
};
pub use cache::CarryForwardCache;
pub use view::{build_step_view, DetachedTree, DictEntry, SequenceEntry, StepView};

/// Sequence name → index of the newly inserted element
pub type Highlights = IndexMap<String, usize>;

/// The inserted index when `current` grew relative to `previous`
fn inserted_index(current: &[Scalar], previous: &[Scalar]) -> Option<usize> {
    (current.len() > previous.len()).then(|| current.len() - 1)
}

/// Highlight the last index of every array that grew since `previous`
pub fn diff_arrays(current: &Frame, previous: Option<&Frame>) -> Highlights {
    let Some(previous) = previous else {
        return Highlights::default();
    };

    current
        .arrays
        .iter()
        .filter_map(|(name, values)| {
            let before = previous.arrays.get(name).map(Vec::as_slice).unwrap_or(&[]);
            inserted_index(values, before).map(|index| (name.clone(), index))
        })
        .collect()
}

/// Linked-list names to render: the current frame's, then cached ones it omitted
pub fn linked_list_names<'a>(current: &'a Frame, cache: &'a CarryForwardCache) -> Vec<&'a str> {
    let mut names: Vec<&str> = current.linked_lists.keys().map(String::as_str).collect();
    for name in cache.names(StructureKind::LinkedList) {
        if !current.linked_lists.contains_key(name) {
            names.push(name);
        }
    }
    names
}

/// Growth rule applied to linked lists, with both sides resolved through the cache
pub fn diff_linked_lists(
    current: &Frame,
    previous: Option<&Frame>,
    cache: &CarryForwardCache,
) -> Highlights {
    let Some(previous) = previous else {
        return Highlights::default();
    };

    linked_list_names(current, cache)
        .into_iter()
        .filter_map(|name| {
            let now = cache.resolve_sequence(
                StructureKind::LinkedList,
                name,
                current.linked_lists.get(name).map(Vec::as_slice),
            );
            let before = cache.resolve_sequence(
                StructureKind::LinkedList,
                name,
                previous.linked_lists.get(name).map(Vec::as_slice),
            );
            inserted_index(now, before).map(|index| (name.to_string(), index))
        })
        .collect()
}

/// Ids in the current main tree that the previous main tree did not have,
/// in the current tree's pre-order
pub fn diff_tree(current: &Frame, previous: Option<&Frame>) -> Vec<NodeId> {
    let (Some(previous), Some(root)) = (previous, current.main_tree()) else {
        return Vec::new();
    };

    let before = id_set(previous.main_tree());
    collect_ids(Some(root))
        .into_iter()
        .filter(|id| !before.contains(id))
        .collect()
}

/// Named nodes that first appeared this step and are not part of the main tree
pub fn diff_detached_nodes<'a>(
    current: &'a Frame,
    previous: Option<&Frame>,
    cache: &'a CarryForwardCache,
) -> Vec<(&'a str, &'a TreeNode)> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let main_tree = cache.resolve_tree(MAIN_TREE, current.main_tree());
    current
        .trees
        .iter()
        .filter(|(name, _)| name.as_str() != MAIN_TREE && name.as_str() != SELF_ALIAS)
        .filter_map(|(name, node)| node.as_ref().map(|node| (name.as_str(), node)))
        .filter(|(name, node)| {
            previous.tree(name).is_none() && !contains_id(main_tree, node.id)
        })
        .collect()
}

/// Drop the `self` entry when its head identity equals another entry's.
///
/// Only head (or root) identity is compared; a `self` that shares a tail with
/// another entry but starts elsewhere is kept.
pub fn dedup_self_alias<N, T, K, F>(entries: Vec<(N, T)>, identity: F) -> Vec<(N, T)>
where
    N: AsRef<str>,
    K: PartialEq,
    F: Fn(&T) -> Option<K>,
{
    let alias_of_other = entries.iter().any(|(name, item)| {
        name.as_ref() == SELF_ALIAS
            && identity(item).is_some_and(|own| {
                entries.iter().any(|(other, other_item)| {
                    other.as_ref() != SELF_ALIAS && identity(other_item).as_ref() == Some(&own)
                })
            })
    });

    if !alias_of_other {
        return entries;
    }
    entries
        .into_iter()
        .filter(|(name, _)| name.as_ref() != SELF_ALIAS)
        .collect()
}

/// Head identity of a flattened linked list.
///
/// The tracer sends lists as plain value sequences without node ids. Two names
/// that reference the same head node always flatten to the same sequence, so
/// the whole sequence stands in for the head's identity.
///
/// This is value equality: an unrelated list that happens to hold the same
/// values as `self` also counts as the same head, and `self` is suppressed.
pub fn list_head_identity(values: &[Scalar]) -> Option<&[Scalar]> {
    (!values.is_empty()).then_some(values)
}
