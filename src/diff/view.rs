//! Render-ready view of one step
//!
//! [`build_step_view`] runs every diff for one `(current, previous)` pair and
//! resolves omitted structures through the carry-forward cache. Renderers
//! (the terminal panes, the JSON dump) read a [`StepView`] and make no
//! structural decisions of their own.

use indexmap::IndexMap;
use serde::Serialize;

use super::{
    dedup_self_alias, diff_arrays, diff_detached_nodes, diff_linked_lists, diff_tree,
    linked_list_names, list_head_identity, CarryForwardCache,
};
use crate::snapshot::{Dict, Frame, NodeId, PointerLabel, Scalar, StructureKind, TreeNode, MAIN_TREE};

/// An array or linked list with its inserted index, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceEntry {
    pub name: String,
    pub values: Vec<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_index: Option<usize>,
    /// Index variables pointing into this array (always empty for linked lists)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pointers: Vec<PointerLabel>,
}

impl SequenceEntry {
    /// Labels of the pointers resting on `index`, joined for display
    pub fn labels_at(&self, index: usize) -> Option<String> {
        let labels: Vec<&str> = self
            .pointers
            .iter()
            .filter(|p| p.index == index)
            .map(|p| p.label.as_str())
            .collect();
        (!labels.is_empty()).then(|| labels.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictEntry {
    pub name: String,
    pub entries: Dict,
}

/// A standalone node referenced by name but not linked into the main tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetachedTree {
    pub name: String,
    pub node: TreeNode,
}

/// Everything a renderer needs for one step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepView {
    pub index: usize,
    pub line_number: Option<u32>,
    pub primitives: IndexMap<String, Scalar>,
    pub array_entries: Vec<SequenceEntry>,
    pub dict_entries: Vec<DictEntry>,
    pub linked_list_entries: Vec<SequenceEntry>,
    pub main_tree: Option<TreeNode>,
    pub tree_highlight_ids: Vec<NodeId>,
    pub detached_trees: Vec<DetachedTree>,
}

impl StepView {
    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.tree_highlight_ids.contains(&id)
    }
}

/// Build the view of frame `index` against its predecessor.
///
/// `cache` must hold the frames before `index` (see
/// [`TraceSession`](crate::session::TraceSession), which replays them in order).
pub fn build_step_view(
    index: usize,
    current: &Frame,
    previous: Option<&Frame>,
    cache: &CarryForwardCache,
) -> StepView {
    let array_highlights = diff_arrays(current, previous);
    let list_highlights = diff_linked_lists(current, previous, cache);

    StepView {
        index,
        line_number: current.line_number,
        primitives: current.primitives.clone(),
        array_entries: array_entries(current, cache, |name| {
            array_highlights.get(name).copied()
        }),
        dict_entries: current
            .dicts
            .iter()
            .map(|(name, entries)| DictEntry {
                name: name.clone(),
                entries: entries.clone(),
            })
            .collect(),
        linked_list_entries: linked_list_entries(current, cache, |name| {
            list_highlights.get(name).copied()
        }),
        main_tree: cache.resolve_tree(MAIN_TREE, current.main_tree()).cloned(),
        tree_highlight_ids: diff_tree(current, previous),
        detached_trees: diff_detached_nodes(current, previous, cache)
            .into_iter()
            .map(|(name, node)| DetachedTree {
                name: name.to_string(),
                node: node.clone(),
            })
            .collect(),
    }
}

/// Arrays of the current frame; when the frame has none at all, the last
/// known arrays are shown instead (with no highlight).
fn array_entries(
    current: &Frame,
    cache: &CarryForwardCache,
    highlight: impl Fn(&str) -> Option<usize>,
) -> Vec<SequenceEntry> {
    let pointers = |name: &str| current.pointer_labels.get(name).cloned().unwrap_or_default();

    if current.arrays.is_empty() {
        return cache
            .names(StructureKind::Array)
            .map(|name| SequenceEntry {
                name: name.to_string(),
                values: cache
                    .resolve_sequence(StructureKind::Array, name, None)
                    .to_vec(),
                highlight_index: None,
                pointers: pointers(name),
            })
            .collect();
    }

    current
        .arrays
        .iter()
        .map(|(name, values)| SequenceEntry {
            name: name.clone(),
            values: values.clone(),
            highlight_index: highlight(name),
            pointers: pointers(name),
        })
        .collect()
}

fn linked_list_entries(
    current: &Frame,
    cache: &CarryForwardCache,
    highlight: impl Fn(&str) -> Option<usize>,
) -> Vec<SequenceEntry> {
    let resolved: Vec<(&str, &[Scalar])> = linked_list_names(current, cache)
        .into_iter()
        .map(|name| {
            let values = cache.resolve_sequence(
                StructureKind::LinkedList,
                name,
                current.linked_lists.get(name).map(Vec::as_slice),
            );
            (name, values)
        })
        .collect();

    dedup_self_alias(resolved, |values| list_head_identity(*values))
        .into_iter()
        .map(|(name, values)| SequenceEntry {
            name: name.to_string(),
            values: values.to_vec(),
            highlight_index: highlight(name),
            pointers: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: serde_json::Value) -> Frame {
        serde_json::from_value(value).expect("test frame should decode")
    }

    #[test]
    fn test_first_frame_view_has_no_highlights() {
        let f0 = frame(json!({
            "line_no": 1,
            "lists": { "arr": [1, 2] },
            "linked": { "head": [3] },
            "trees": { "root": { "id": 1, "val": 5 }, "n": { "id": 2, "val": 6 } }
        }));
        let view = build_step_view(0, &f0, None, &CarryForwardCache::new());

        assert_eq!(view.line_number, Some(1));
        assert!(view.array_entries.iter().all(|e| e.highlight_index.is_none()));
        assert!(view.linked_list_entries.iter().all(|e| e.highlight_index.is_none()));
        assert!(view.tree_highlight_ids.is_empty());
        assert!(view.detached_trees.is_empty());
        assert_eq!(view.main_tree.map(|t| t.id), Some(1));
    }

    #[test]
    fn test_view_collects_all_deltas() {
        let f0 = frame(json!({
            "lists": { "arr": [1, 2] },
            "linked": { "head": [3, 1] },
            "trees": { "root": { "id": 1, "val": 5 } }
        }));
        let f1 = frame(json!({
            "line_no": 7,
            "prims": { "i": 1 },
            "lists": { "arr": [1, 2, 3] },
            "dicts": { "m": { "a": 1 } },
            "linked": { "head": [3, 1, 4], "self": [3, 1, 4] },
            "trees": {
                "root": { "id": 1, "val": 5, "left": { "id": 2, "val": 4 } },
                "n": { "id": 9, "val": 8 }
            },
            "array_indices": { "arr": [["i", 1]] }
        }));
        let mut cache = CarryForwardCache::new();
        cache.observe(&f0);

        let view = build_step_view(1, &f1, Some(&f0), &cache);

        assert_eq!(view.array_entries[0].highlight_index, Some(2));
        assert_eq!(view.array_entries[0].labels_at(1), Some("i".to_string()));
        assert_eq!(view.array_entries[0].labels_at(0), None);
        assert_eq!(view.dict_entries[0].name, "m");
        assert_eq!(view.linked_list_entries.len(), 1);
        assert_eq!(view.linked_list_entries[0].name, "head");
        assert_eq!(view.linked_list_entries[0].highlight_index, Some(2));
        assert_eq!(view.tree_highlight_ids, vec![2]);
        assert!(view.is_highlighted(2));
        assert_eq!(view.detached_trees.len(), 1);
        assert_eq!(view.detached_trees[0].name, "n");
    }

    #[test]
    fn test_view_carries_omitted_structures() {
        let f0 = frame(json!({
            "lists": { "arr": [5, 6] },
            "linked": { "x": [1, 2] },
            "trees": { "root": { "id": 1, "val": 5 } }
        }));
        let f1 = frame(json!({ "line_no": 2 }));
        let mut cache = CarryForwardCache::new();
        cache.observe(&f0);

        let view = build_step_view(1, &f1, Some(&f0), &cache);

        assert_eq!(view.array_entries[0].values, vec![json!(5), json!(6)]);
        assert_eq!(view.array_entries[0].highlight_index, None);
        assert_eq!(view.linked_list_entries[0].values, vec![json!(1), json!(2)]);
        assert_eq!(view.linked_list_entries[0].highlight_index, None);
        assert_eq!(view.main_tree.map(|t| t.id), Some(1));
        assert!(view.tree_highlight_ids.is_empty());
    }

    #[test]
    fn test_view_serializes_wire_friendly() {
        let f0 = frame(json!({ "lists": { "a": [1] } }));
        let view = build_step_view(0, &f0, None, &CarryForwardCache::new());
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["array_entries"][0]["name"], "a");
        assert!(value["array_entries"][0].get("highlight_index").is_none());
    }
}
