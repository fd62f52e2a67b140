//! Criteria-tree node records as submitted by the caller.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::CriterionId;

/// Role of a node in the criteria tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A criterion: part of the tree structure, compared against its
    /// siblings under their shared parent.
    Criterion,
    /// An alternative: a candidate outcome scored under every leaf
    /// criterion. Alternatives form a flat set; their parent links are
    /// not part of the tree structure.
    Alternative,
}

/// One node of the caller-owned criteria tree.
///
/// The engine treats records as read-only input. `level` is the depth
/// from the root (root = 0) and is cross-checked against the actual
/// tree shape during construction. `order` fixes the position among
/// siblings and thereby the matrix item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    #[serde(default)]
    pub name: String,
    pub parent_id: Option<CriterionId>,
    pub level: u32,
    pub order: u32,
    pub kind: NodeKind,
}

impl Criterion {
    /// Creates an unnamed node record.
    pub fn new(
        id: CriterionId,
        parent_id: Option<CriterionId>,
        level: u32,
        order: u32,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            name: String::new(),
            parent_id,
            level,
            order,
            kind,
        }
    }

    /// Attaches a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
