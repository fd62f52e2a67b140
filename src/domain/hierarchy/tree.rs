//! Arena-backed criteria tree.
//!
//! Nodes live in a flat array with integer child references, so
//! traversal is iterative and deep hierarchies cannot overflow the
//! stack.

use std::collections::HashMap;

use crate::domain::foundation::{CriterionId, EngineError};
use crate::domain::hierarchy::{Criterion, NodeKind};

/// Validated criteria tree plus the flat alternative set.
///
/// Construction guarantees exactly one root criterion, resolvable
/// parents, no cycles, and declared levels that match actual depth.
/// Sibling lists and the alternative set are sorted by `(order, id)`,
/// which fixes the item order of every comparison matrix.
#[derive(Debug, Clone)]
pub struct CriterionTree {
    nodes: Vec<Criterion>,
    children: Vec<Vec<usize>>,
    alternatives: Vec<usize>,
    index: HashMap<CriterionId, usize>,
    root: usize,
}

impl CriterionTree {
    /// Builds and validates a tree from caller-submitted node records.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::IncompleteHierarchy`] when the records do
    /// not form a single-rooted tree: duplicate ids, zero or multiple
    /// roots, a parent that does not resolve, a criterion parented to
    /// an alternative, unreachable nodes (disconnected or cyclic), or a
    /// declared `level` that contradicts the node's actual depth.
    /// Alternative nodes are exempt from parent and level checks; only
    /// their id and order matter.
    pub fn from_records(records: Vec<Criterion>) -> Result<Self, EngineError> {
        if records.is_empty() {
            return Err(EngineError::incomplete_hierarchy("criteria tree has no nodes"));
        }

        let mut index = HashMap::with_capacity(records.len());
        for (position, node) in records.iter().enumerate() {
            if index.insert(node.id, position).is_some() {
                return Err(EngineError::incomplete_hierarchy(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }

        let mut root = None;
        for (position, node) in records.iter().enumerate() {
            if node.kind == NodeKind::Criterion && node.parent_id.is_none() {
                if root.is_some() {
                    return Err(EngineError::incomplete_hierarchy(
                        "criteria tree has more than one root",
                    ));
                }
                root = Some(position);
            }
        }
        let root = root.ok_or_else(|| {
            EngineError::incomplete_hierarchy("criteria tree has no root criterion")
        })?;

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        for (position, node) in records.iter().enumerate() {
            if node.kind != NodeKind::Criterion {
                continue;
            }
            let Some(parent_id) = node.parent_id else {
                continue;
            };
            let parent = *index.get(&parent_id).ok_or_else(|| {
                EngineError::incomplete_hierarchy(format!(
                    "node {} references missing parent {}",
                    node.id, parent_id
                ))
            })?;
            if records[parent].kind != NodeKind::Criterion {
                return Err(EngineError::incomplete_hierarchy(format!(
                    "criterion {} is parented to alternative {}",
                    node.id, parent_id
                )));
            }
            children[parent].push(position);
        }
        for list in &mut children {
            list.sort_by_key(|&child| (records[child].order, records[child].id));
        }

        let mut alternatives: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == NodeKind::Alternative)
            .map(|(position, _)| position)
            .collect();
        alternatives.sort_by_key(|&alt| (records[alt].order, records[alt].id));

        // Every criterion must be reachable from the root. Each node has
        // one parent edge, so a miss means a disconnected or cyclic
        // cluster.
        let mut depth = vec![0u32; records.len()];
        let mut visited = vec![false; records.len()];
        let mut stack = vec![(root, 0u32)];
        let mut reached = 0usize;
        while let Some((node, d)) = stack.pop() {
            visited[node] = true;
            depth[node] = d;
            reached += 1;
            for &child in &children[node] {
                stack.push((child, d + 1));
            }
        }
        let criterion_count = records
            .iter()
            .filter(|node| node.kind == NodeKind::Criterion)
            .count();
        if reached != criterion_count {
            return Err(EngineError::incomplete_hierarchy(
                "criteria tree contains criteria unreachable from the root (cyclic or disconnected)",
            ));
        }

        for (position, node) in records.iter().enumerate() {
            if node.kind != NodeKind::Criterion {
                continue;
            }
            if node.level != depth[position] {
                return Err(EngineError::incomplete_hierarchy(format!(
                    "node {} declares level {} but sits at depth {}",
                    node.id, node.level, depth[position]
                )));
            }
        }

        Ok(Self {
            nodes: records,
            children,
            alternatives,
            index,
            root,
        })
    }

    /// Returns the root criterion.
    pub fn root(&self) -> &Criterion {
        &self.nodes[self.root]
    }

    /// Returns the total number of nodes, alternatives included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: CriterionId) -> Option<&Criterion> {
        self.index.get(&id).map(|&position| &self.nodes[position])
    }

    /// Returns a node's criterion children in sibling order.
    pub fn children_of(&self, id: CriterionId) -> Vec<&Criterion> {
        match self.index.get(&id) {
            Some(&position) => self.children[position]
                .iter()
                .map(|&child| &self.nodes[child])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns the parent criterion, or `None` for the root and for
    /// alternatives.
    pub fn parent_of(&self, id: CriterionId) -> Option<&Criterion> {
        let node = self.node(id)?;
        if node.kind != NodeKind::Criterion {
            return None;
        }
        node.parent_id.and_then(|parent| self.node(parent))
    }

    /// Returns the alternative set, sorted by `(order, id)`.
    pub fn alternatives(&self) -> Vec<&Criterion> {
        self.alternatives
            .iter()
            .map(|&position| &self.nodes[position])
            .collect()
    }

    /// Returns true if the node is a criterion without criterion
    /// children.
    pub fn is_leaf(&self, id: CriterionId) -> bool {
        match self.index.get(&id) {
            Some(&position) => {
                self.nodes[position].kind == NodeKind::Criterion
                    && self.children[position].is_empty()
            }
            None => false,
        }
    }

    /// Returns the leaf criteria in depth-first pre-order.
    pub fn leaf_criteria(&self) -> Vec<&Criterion> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(position) = stack.pop() {
            if self.children[position].is_empty() {
                leaves.push(&self.nodes[position]);
                continue;
            }
            for &child in self.children[position].iter().rev() {
                stack.push(child);
            }
        }
        leaves
    }

    pub(crate) fn root_position(&self) -> usize {
        self.root
    }

    pub(crate) fn node_at(&self, position: usize) -> &Criterion {
        &self.nodes[position]
    }

    pub(crate) fn child_positions(&self, position: usize) -> &[usize] {
        &self.children[position]
    }

    pub(crate) fn position(&self, id: CriterionId) -> Option<usize> {
        self.index.get(&id).copied()
    }
}
