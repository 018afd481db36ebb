//! Permission forest built over flat records.
//!
//! Records are stored in an arena (`Vec<Permission>`) and indexed by id.
//! Parent and child links are slot indices computed once at construction, so
//! navigation never follows a live back-reference and a malformed parent
//! chain is caught before any traversal happens.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{Result, TreeError};
use crate::record::{Permission, PermissionId};

/// A forest of permission records.
///
/// Roots and every sibling group are ordered by `sort_order` ascending; ties
/// keep the order in which the records were supplied.
#[derive(Debug, Clone, Default)]
pub struct PermissionForest {
    nodes: Vec<Permission>,
    index: HashMap<PermissionId, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

/// Owned, nested rendering of a forest node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionNode {
    #[serde(flatten)]
    pub permission: Permission,
    pub children: Vec<PermissionNode>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

impl PermissionForest {
    /// Builds a forest from flat records.
    ///
    /// Records without a parent, or whose parent id is not among `records`,
    /// become roots. Fails with [`TreeError::DuplicateId`] when two records
    /// share an id and with [`TreeError::Cycle`] when a record is its own
    /// transitive ancestor.
    pub fn build(records: Vec<Permission>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (slot, record) in records.iter().enumerate() {
            if index.insert(record.id, slot).is_some() {
                return Err(TreeError::DuplicateId(record.id));
            }
        }

        let parents: Vec<Option<usize>> = records
            .iter()
            .map(|record| {
                record
                    .parent_id
                    .and_then(|parent_id| index.get(&parent_id).copied())
            })
            .collect();

        for (record, parent) in records.iter().zip(&parents) {
            if let (Some(parent_id), None) = (record.parent_id, parent) {
                warn!(
                    "Permission {} ({}) references missing parent {}, treating it as a root",
                    record.id, record.code, parent_id
                );
            }
        }

        detect_cycles(&records, &parents)?;

        let forest = Self::assemble(records, parents);
        debug!(
            "Built permission forest with {} records and {} roots",
            forest.len(),
            forest.roots.len()
        );
        Ok(forest)
    }

    /// Wires children and roots for records already known to be acyclic.
    fn assemble(nodes: Vec<Permission>, parents: Vec<Option<usize>>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(slot, record)| (record.id, slot))
            .collect();

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (slot, parent) in parents.iter().enumerate() {
            match parent {
                Some(parent) => children[*parent].push(slot),
                None => roots.push(slot),
            }
        }

        roots.sort_by_key(|slot| nodes[*slot].sort_order);
        for group in &mut children {
            group.sort_by_key(|slot| nodes[*slot].sort_order);
        }

        Self {
            nodes,
            index,
            parents,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: PermissionId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: PermissionId) -> Option<&Permission> {
        self.index.get(&id).map(|slot| &self.nodes[*slot])
    }

    /// Root records in sibling order.
    pub fn roots(&self) -> Vec<&Permission> {
        self.roots.iter().map(|slot| &self.nodes[*slot]).collect()
    }

    /// The resolved parent of `id`. Orphans and roots have none.
    pub fn parent_of(&self, id: PermissionId) -> Option<&Permission> {
        let slot = *self.index.get(&id)?;
        self.parents[slot].map(|parent| &self.nodes[parent])
    }

    /// Direct children of `id` in sibling order; empty for unknown ids.
    pub fn children_of(&self, id: PermissionId) -> Vec<&Permission> {
        self.index
            .get(&id)
            .map(|slot| {
                self.children[*slot]
                    .iter()
                    .map(|child| &self.nodes[*child])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: PermissionId) -> Vec<&Permission> {
        let mut ancestors = Vec::new();
        let mut cursor = self.index.get(&id).and_then(|slot| self.parents[*slot]);
        while let Some(slot) = cursor {
            ancestors.push(&self.nodes[slot]);
            cursor = self.parents[slot];
        }
        ancestors
    }

    /// Depth-first, parent before children, siblings by `sort_order`.
    pub fn flatten(&self) -> Vec<&Permission> {
        self.preorder(|_| true)
            .into_iter()
            .map(|slot| &self.nodes[slot])
            .collect()
    }

    /// Keeps a record only when it and every ancestor satisfy `keep`.
    ///
    /// A rejected record removes its whole subtree, whatever the descendants'
    /// own fields say.
    pub fn prune<F>(&self, keep: F) -> PermissionForest
    where
        F: Fn(&Permission) -> bool,
    {
        let kept = self.preorder(|record| keep(record));
        let remap: HashMap<usize, usize> = kept
            .iter()
            .enumerate()
            .map(|(new_slot, old_slot)| (*old_slot, new_slot))
            .collect();

        let nodes = kept.iter().map(|slot| self.nodes[*slot].clone()).collect();
        let parents = kept
            .iter()
            .map(|slot| self.parents[*slot].and_then(|parent| remap.get(&parent).copied()))
            .collect();

        Self::assemble(nodes, parents)
    }

    /// Owned nested rendering, e.g. for JSON output.
    pub fn to_nodes(&self) -> Vec<PermissionNode> {
        self.roots.iter().map(|slot| self.node_at(*slot)).collect()
    }

    fn node_at(&self, slot: usize) -> PermissionNode {
        PermissionNode {
            permission: self.nodes[slot].clone(),
            children: self.children[slot]
                .iter()
                .map(|child| self.node_at(*child))
                .collect(),
        }
    }

    /// Pre-order slots, descending only into records accepted by `visit`.
    fn preorder<F>(&self, visit: F) -> Vec<usize>
    where
        F: Fn(&Permission) -> bool,
    {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(slot) = stack.pop() {
            if !visit(&self.nodes[slot]) {
                continue;
            }
            order.push(slot);
            stack.extend(self.children[slot].iter().rev().copied());
        }
        order
    }
}

/// Walks each parent chain once; revisiting a slot on the current chain is a cycle.
fn detect_cycles(records: &[Permission], parents: &[Option<usize>]) -> Result<()> {
    let mut marks = vec![Mark::Unvisited; records.len()];
    let mut chain = Vec::new();

    for start in 0..records.len() {
        chain.clear();
        let mut cursor = Some(start);
        while let Some(slot) = cursor {
            match marks[slot] {
                Mark::Done => break,
                Mark::OnPath => {
                    return Err(TreeError::Cycle {
                        id: records[slot].id,
                    })
                }
                Mark::Unvisited => {
                    marks[slot] = Mark::OnPath;
                    chain.push(slot);
                    cursor = parents[slot];
                }
            }
        }
        for slot in &chain {
            marks[*slot] = Mark::Done;
        }
    }

    Ok(())
}
