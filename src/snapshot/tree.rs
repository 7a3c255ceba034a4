//! Tree nodes and the identity index
//!
//! Node identity across frames is the tracer-assigned [`NodeId`] and nothing
//! else: two nodes with equal values are still different nodes, and a node
//! whose value or children changed between frames is still the same node.
//! Comparing two frames' trees is therefore set arithmetic over the ids
//! returned by [`collect_ids`].

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::Scalar;

/// Stable node identity assigned by the tracer
pub type NodeId = u64;

/// Red-black colouring, when the traced tree carries one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    #[serde(alias = "RED", alias = "Red")]
    Red,
    #[serde(alias = "BLACK", alias = "Black")]
    Black,
}

/// A binary tree node; children are owned exclusively by their parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    #[serde(rename = "val", default)]
    pub value: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NodeColor>,
    #[serde(default)]
    pub left: Option<Box<TreeNode>>,
    #[serde(default)]
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    /// Create a leaf node
    pub fn leaf(id: NodeId, value: impl Into<Scalar>) -> Self {
        TreeNode {
            id,
            value: value.into(),
            color: None,
            left: None,
            right: None,
        }
    }

    pub fn with_left(mut self, child: TreeNode) -> Self {
        self.left = Some(Box::new(child));
        self
    }

    pub fn with_right(mut self, child: TreeNode) -> Self {
        self.right = Some(Box::new(child));
        self
    }

    pub fn with_color(mut self, color: NodeColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Direct children, left first
    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.left.as_deref().into_iter().chain(self.right.as_deref())
    }

    /// Find the node with the given id in this subtree
    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        PreOrder::new(Some(self)).find(|node| node.id == id)
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        PreOrder::new(Some(self)).count()
    }

    /// Number of levels in this subtree (a leaf has height 1)
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            for child in node.children() {
                stack.push((child, depth + 1));
            }
        }
        max
    }
}

/// Pre-order walk (self, left subtree, right subtree) with an explicit stack,
/// so degenerate trees do not recurse once per level.
struct PreOrder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> PreOrder<'a> {
    fn new(root: Option<&'a TreeNode>) -> Self {
        PreOrder {
            stack: root.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(right) = node.right.as_deref() {
            self.stack.push(right);
        }
        if let Some(left) = node.left.as_deref() {
            self.stack.push(left);
        }
        Some(node)
    }
}

/// All ids reachable from `root`, in pre-order. Empty for an absent root.
pub fn collect_ids(root: Option<&TreeNode>) -> Vec<NodeId> {
    PreOrder::new(root).map(|node| node.id).collect()
}

/// Whether `id` is reachable from `root`
pub fn contains_id(root: Option<&TreeNode>, id: NodeId) -> bool {
    PreOrder::new(root).any(|node| node.id == id)
}

/// The ids reachable from `root` as a set, for frame-to-frame differences
pub fn id_set(root: Option<&TreeNode>) -> FxHashSet<NodeId> {
    PreOrder::new(root).map(|node| node.id).collect()
}
