use serde::{Deserialize, Serialize};

/// Outcome of a cycle probe from one starting skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleReport {
    pub circular: bool,
    /// For a cycle, the offending segment with the repeated name at both
    /// ends (e.g. `a, b, c, a`). Empty when no cycle was found.
    pub path: Vec<String>,
    /// Whether any branch was cut off by the depth or revisit bound before
    /// it could be fully explored.
    pub truncated: bool,
}

impl CycleReport {
    pub fn acyclic(truncated: bool) -> Self {
        Self {
            circular: false,
            path: Vec::new(),
            truncated,
        }
    }
}

/// One node of the rendered dependency tree.
///
/// `truncated` marks a node whose children were deliberately not expanded
/// (depth bound reached, or the node was already expanded elsewhere in the
/// same traversal); it does not imply a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyNode {
    pub name: String,
    pub children: Vec<DependencyNode>,
    pub truncated: bool,
}

impl DependencyNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            truncated: false,
        }
    }

    /// Total node count of the subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(DependencyNode::size).sum::<usize>()
    }
}
