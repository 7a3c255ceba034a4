//! Frame model for traced program state
//!
//! A [`Frame`] is one execution step as reported by the external tracer. The
//! field names on the wire are fixed by the tracer (`line_no`, `prims`,
//! `lists`, `dicts`, `linked`, `trees`, `array_indices`); they are mapped onto
//! typed fields here so every structure kind is validated when the response
//! is decoded, before any diffing happens.
//!
//! - [`tree`]: tree nodes and the identity index (`collect_ids`, `contains_id`)
//! - [`Trace`]: the ordered, immutable frame sequence of one run
//! - [`StructureSnapshot`]: tagged union over the structure kinds, used by the
//!   carry-forward cache

pub mod tree;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

pub use tree::{collect_ids, contains_id, NodeColor, NodeId, TreeNode};

/// A scalar value as emitted by the tracer (number, string, bool or null)
pub type Scalar = serde_json::Value;

/// Key → value mapping in program iteration order
pub type Dict = serde_json::Map<String, serde_json::Value>;

/// Name of the tree that holds the primary structure being built
pub const MAIN_TREE: &str = "root";

/// Name the tracer uses for a method receiver
pub const SELF_ALIAS: &str = "self";

/// A named index variable pointing into an array (`[label, index]` on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerLabel {
    pub label: String,
    pub index: usize,
}

impl PointerLabel {
    /// Decode one `[label, index]` pair.
    ///
    /// The tracer labels every integer local, and Python booleans are
    /// integers, so `["swapped", true]` reads as index 1. Anything that is not
    /// a non-negative integer or a bool yields `None`.
    fn from_wire(pair: &serde_json::Value) -> Option<Self> {
        let [label, index] = pair.as_array()?.as_slice() else {
            return None;
        };
        let index = match index {
            serde_json::Value::Bool(flag) => usize::from(*flag),
            other => usize::try_from(other.as_u64()?).ok()?,
        };
        Some(PointerLabel {
            label: label.as_str()?.to_string(),
            index,
        })
    }
}

/// One execution step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    #[serde(rename = "line_no", deserialize_with = "deserialize_line_number")]
    pub line_number: Option<u32>,
    #[serde(rename = "prims")]
    pub primitives: IndexMap<String, Scalar>,
    #[serde(rename = "lists")]
    pub arrays: IndexMap<String, Vec<Scalar>>,
    pub dicts: IndexMap<String, Dict>,
    #[serde(rename = "linked")]
    pub linked_lists: IndexMap<String, Vec<Scalar>>,
    pub trees: IndexMap<String, Option<TreeNode>>,
    #[serde(rename = "array_indices", deserialize_with = "deserialize_pointer_labels")]
    pub pointer_labels: IndexMap<String, Vec<PointerLabel>>,
}

/// The tracer reports line 0 before the first statement ran; treat it as absent.
fn deserialize_line_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let line = Option::<u32>::deserialize(deserializer)?;
    Ok(line.filter(|&n| n > 0))
}

/// Pointer labels per array; malformed pairs are skipped instead of failing the frame.
fn deserialize_pointer_labels<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, Vec<PointerLabel>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Vec<serde_json::Value>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, pairs)| {
            let labels = pairs.iter().filter_map(PointerLabel::from_wire).collect();
            (name, labels)
        })
        .collect())
}

impl Frame {
    /// The primary tree of this frame, if the frame reports one
    pub fn main_tree(&self) -> Option<&TreeNode> {
        self.tree(MAIN_TREE)
    }

    /// Look up a named tree; a `null` entry counts as absent
    pub fn tree(&self, name: &str) -> Option<&TreeNode> {
        self.trees.get(name).and_then(Option::as_ref)
    }

    /// Extract one named structure of the given kind as an owned snapshot
    pub fn snapshot(&self, kind: StructureKind, name: &str) -> Option<StructureSnapshot> {
        match kind {
            StructureKind::Array => self
                .arrays
                .get(name)
                .map(|values| StructureSnapshot::Array(values.clone())),
            StructureKind::Dict => self
                .dicts
                .get(name)
                .map(|dict| StructureSnapshot::Dict(dict.clone())),
            StructureKind::LinkedList => self
                .linked_lists
                .get(name)
                .map(|values| StructureSnapshot::LinkedList(values.clone())),
            StructureKind::Tree => self
                .trees
                .get(name)
                .map(|root| StructureSnapshot::Tree(root.clone())),
        }
    }
}

/// The structure kinds a frame can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Array,
    Dict,
    LinkedList,
    Tree,
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StructureKind::Array => "array",
            StructureKind::Dict => "dict",
            StructureKind::LinkedList => "list",
            StructureKind::Tree => "tree",
        };
        f.write_str(name)
    }
}

/// One named structure's state, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StructureSnapshot {
    Array(Vec<Scalar>),
    Dict(Dict),
    LinkedList(Vec<Scalar>),
    Tree(Option<TreeNode>),
}

impl StructureSnapshot {
    /// The empty value of a kind (what a never-seen structure resolves to)
    pub fn empty(kind: StructureKind) -> Self {
        match kind {
            StructureKind::Array => StructureSnapshot::Array(Vec::new()),
            StructureKind::Dict => StructureSnapshot::Dict(Dict::new()),
            StructureKind::LinkedList => StructureSnapshot::LinkedList(Vec::new()),
            StructureKind::Tree => StructureSnapshot::Tree(None),
        }
    }

    pub fn kind(&self) -> StructureKind {
        match self {
            StructureSnapshot::Array(_) => StructureKind::Array,
            StructureSnapshot::Dict(_) => StructureKind::Dict,
            StructureSnapshot::LinkedList(_) => StructureKind::LinkedList,
            StructureSnapshot::Tree(_) => StructureKind::Tree,
        }
    }

    /// Empty sequences and absent tree roots never overwrite cached state
    pub fn is_empty(&self) -> bool {
        match self {
            StructureSnapshot::Array(values) | StructureSnapshot::LinkedList(values) => {
                values.is_empty()
            }
            StructureSnapshot::Dict(dict) => dict.is_empty(),
            StructureSnapshot::Tree(root) => root.is_none(),
        }
    }

    /// Borrow the element sequence of an array or linked list
    pub fn as_sequence(&self) -> Option<&[Scalar]> {
        match self {
            StructureSnapshot::Array(values) | StructureSnapshot::LinkedList(values) => {
                Some(values)
            }
            _ => None,
        }
    }

    /// Borrow the root of a tree snapshot
    pub fn as_tree(&self) -> Option<&TreeNode> {
        match self {
            StructureSnapshot::Tree(root) => root.as_ref(),
            _ => None,
        }
    }
}

/// The ordered frame sequence of one run
#[derive(Debug, Clone, Default)]
pub struct Trace {
    frames: Vec<Frame>,
}

impl Trace {
    pub fn new(frames: Vec<Frame>) -> Self {
        Trace { frames }
    }

    /// Get a frame by index
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// The frame at `index` together with its predecessor (absent at index 0)
    pub fn pair(&self, index: usize) -> Option<(Option<&Frame>, &Frame)> {
        let current = self.frames.get(index)?;
        let previous = index.checked_sub(1).and_then(|i| self.frames.get(i));
        Some((previous, current))
    }

    /// Get the number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
