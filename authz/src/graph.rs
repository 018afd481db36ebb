//! Role resolution.
//!
//! Users reach roles through direct bindings in the [`PolicyStore`]. Roles may
//! additionally inherit other roles; the graph stores those edges and
//! resolves the transitive closure. With no edges, a user's effective roles
//! are exactly their direct bindings.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::error::{AuthzError, Result};
use crate::store::PolicyStore;
use crate::types::{validate_identifier, RoleInheritance};

#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    /// role -> roles it inherits from
    parents: HashMap<String, BTreeSet<String>>,
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `role -> parent`. Returns `false` when already present.
    ///
    /// Rejects self-inheritance and any edge that would close a cycle.
    pub fn add_inheritance(&mut self, role: &str, parent: &str) -> Result<bool> {
        let role = validate_identifier(role, "role code")?;
        let parent = validate_identifier(parent, "role code")?;

        if role == parent || self.inherits(&parent, &role) {
            return Err(AuthzError::CyclicInheritance { role, parent });
        }

        Ok(self.parents.entry(role).or_default().insert(parent))
    }

    /// Removes the edge `role -> parent`. Returns `false` when absent.
    pub fn remove_inheritance(&mut self, role: &str, parent: &str) -> bool {
        let role = role.trim();
        let Some(parents) = self.parents.get_mut(role) else {
            return false;
        };
        let removed = parents.remove(parent.trim());
        if parents.is_empty() {
            self.parents.remove(role);
        }
        removed
    }

    /// Whether `role` reaches `ancestor` through one or more edges.
    pub fn inherits(&self, role: &str, ancestor: &str) -> bool {
        self.parents
            .get(role)
            .is_some_and(|parents| self.closure(parents.iter().cloned()).contains(ancestor))
    }

    /// Every role reachable from `roles`, including `roles` themselves.
    pub fn closure<I>(&self, roles: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut resolved = BTreeSet::new();
        let mut queue: VecDeque<String> = roles.into_iter().collect();
        while let Some(role) = queue.pop_front() {
            if !resolved.insert(role.clone()) {
                continue;
            }
            if let Some(parents) = self.parents.get(&role) {
                queue.extend(
                    parents
                        .iter()
                        .filter(|parent| !resolved.contains(*parent))
                        .cloned(),
                );
            }
        }
        resolved
    }

    /// Direct bindings of `user_id` plus everything they inherit.
    pub fn effective_roles(&self, store: &PolicyStore, user_id: &str) -> BTreeSet<String> {
        match store.roles_ref(user_id) {
            Some(direct) if self.parents.is_empty() => direct.clone(),
            Some(direct) => self.closure(direct.iter().cloned()),
            None => BTreeSet::new(),
        }
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<RoleInheritance> {
        let mut edges: Vec<RoleInheritance> = self
            .parents
            .iter()
            .flat_map(|(role, parents)| {
                parents
                    .iter()
                    .map(move |parent| RoleInheritance::new(role.clone(), parent.clone()))
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
