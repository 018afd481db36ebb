//! The policy store: allow rules and user to role bindings.
//!
//! Rules are kept indexed by subject so a decision only scans the grants of
//! the subject and its roles. Both collections are sets; every mutation is
//! idempotent and reports whether it changed anything.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::Result;
use crate::types::{validate_identifier, Grant, PolicyRule, RoleBinding};

#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    grants: HashMap<String, HashSet<Grant>>,
    bindings: HashMap<String, BTreeSet<String>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rule. Returns `false` when it was already present.
    pub fn add_policy(&mut self, rule: &PolicyRule) -> bool {
        self.grants
            .entry(rule.subject.clone())
            .or_default()
            .insert(rule.grant())
    }

    /// Replaces every rule with the rules of `other`, keeping bindings.
    pub(crate) fn replace_policies(&mut self, other: PolicyStore) {
        self.grants = other.grants;
    }

    /// Removes a rule. Returns `false` when it was absent.
    pub fn remove_policy(&mut self, rule: &PolicyRule) -> bool {
        let Some(grants) = self.grants.get_mut(&rule.subject) else {
            return false;
        };
        let removed = grants.remove(&rule.grant());
        if grants.is_empty() {
            self.grants.remove(&rule.subject);
        }
        removed
    }

    pub fn contains_policy(&self, rule: &PolicyRule) -> bool {
        self.grants
            .get(&rule.subject)
            .is_some_and(|grants| grants.contains(&rule.grant()))
    }

    /// Grants held directly by `subject`.
    pub fn grants_for(&self, subject: &str) -> impl Iterator<Item = &Grant> {
        self.grants.get(subject).into_iter().flatten()
    }

    /// All rules, sorted by subject, pattern and action.
    pub fn policies(&self) -> Vec<PolicyRule> {
        let mut rules: Vec<PolicyRule> = self
            .grants
            .iter()
            .flat_map(|(subject, grants)| {
                grants.iter().map(move |grant| PolicyRule {
                    subject: subject.clone(),
                    pattern: grant.pattern.clone(),
                    action: grant.action,
                })
            })
            .collect();
        rules.sort();
        rules
    }

    pub fn policy_count(&self) -> usize {
        self.grants.values().map(HashSet::len).sum()
    }

    /// Binds `user_id` to `role_code`. Returns `false` when already bound.
    pub fn add_role_binding(&mut self, user_id: &str, role_code: &str) -> Result<bool> {
        let user_id = validate_identifier(user_id, "user id")?;
        let role_code = validate_identifier(role_code, "role code")?;
        Ok(self.bindings.entry(user_id).or_default().insert(role_code))
    }

    /// Unbinds `user_id` from `role_code`. Returns `false` when not bound.
    pub fn remove_role_binding(&mut self, user_id: &str, role_code: &str) -> bool {
        let user_id = user_id.trim();
        let Some(roles) = self.bindings.get_mut(user_id) else {
            return false;
        };
        let removed = roles.remove(role_code.trim());
        if roles.is_empty() {
            self.bindings.remove(user_id);
        }
        removed
    }

    /// Direct role bindings of `user_id`. Inheritance is not resolved here.
    pub fn roles_of(&self, user_id: &str) -> BTreeSet<String> {
        self.bindings.get(user_id).cloned().unwrap_or_default()
    }

    pub(crate) fn roles_ref(&self, user_id: &str) -> Option<&BTreeSet<String>> {
        self.bindings.get(user_id)
    }

    /// All bindings, sorted by user then role.
    pub fn bindings(&self) -> Vec<RoleBinding> {
        let mut bindings: Vec<RoleBinding> = self
            .bindings
            .iter()
            .flat_map(|(user_id, roles)| {
                roles
                    .iter()
                    .map(move |role_code| RoleBinding::new(user_id.clone(), role_code.clone()))
            })
            .collect();
        bindings.sort();
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;

    fn rule(subject: &str, pattern: &str, action: &str) -> PolicyRule {
        PolicyRule::new(subject, pattern, action).unwrap()
    }

    #[test]
    fn test_add_policy_is_idempotent() {
        let mut store = PolicyStore::new();
        let r = rule("user", "/api/users", "GET");

        assert!(store.add_policy(&r));
        let once = store.policies();
        assert!(!store.add_policy(&r));
        assert_eq!(store.policies(), once);
        assert_eq!(store.policy_count(), 1);
    }

    #[test]
    fn test_equivalent_spellings_are_one_rule() {
        let mut store = PolicyStore::new();
        assert!(store.add_policy(&rule("user", "/api/users", "GET")));
        assert!(!store.add_policy(&rule("user", "/api/users/", "get")));
        assert_eq!(store.policy_count(), 1);
    }

    #[test]
    fn test_remove_policy_is_idempotent() {
        let mut store = PolicyStore::new();
        let r = rule("user", "/api/users", "GET");
        store.add_policy(&r);
        store.add_policy(&rule("user", "/api/roles", "GET"));

        assert!(store.remove_policy(&r));
        let once = store.policies();
        assert!(!store.remove_policy(&r));
        assert_eq!(store.policies(), once);
        assert!(!store.contains_policy(&r));
        assert_eq!(store.policy_count(), 1);
    }

    #[test]
    fn test_remove_absent_policy() {
        let mut store = PolicyStore::new();
        assert!(!store.remove_policy(&rule("ghost", "*", "*")));
    }

    #[test]
    fn test_policies_sorted() {
        let mut store = PolicyStore::new();
        store.add_policy(&rule("user", "/api/users", "GET"));
        store.add_policy(&rule("admin", "*", "*"));
        let subjects: Vec<String> = store.policies().into_iter().map(|r| r.subject).collect();
        assert_eq!(subjects, vec!["admin", "user"]);
    }

    #[test]
    fn test_role_bindings() {
        let mut store = PolicyStore::new();
        assert!(store.add_role_binding("u1", "user").unwrap());
        assert!(!store.add_role_binding("u1", "user").unwrap());
        assert!(store.add_role_binding("u1", "manager").unwrap());

        let roles: Vec<String> = store.roles_of("u1").into_iter().collect();
        assert_eq!(roles, vec!["manager", "user"]);

        assert!(store.remove_role_binding("u1", "user"));
        assert!(!store.remove_role_binding("u1", "user"));
        assert!(store.remove_role_binding("u1", "manager"));
        assert!(store.roles_of("u1").is_empty());
        assert!(store.bindings().is_empty());
    }

    #[test]
    fn test_role_binding_rejects_empty_identifiers() {
        let mut store = PolicyStore::new();
        assert!(matches!(
            store.add_role_binding("", "user"),
            Err(AuthzError::InvalidSubject(_))
        ));
        assert!(matches!(
            store.add_role_binding("u1", "  "),
            Err(AuthzError::InvalidSubject(_))
        ));
    }

    #[test]
    fn test_grants_for_unknown_subject_is_empty() {
        let store = PolicyStore::new();
        assert_eq!(store.grants_for("nobody").count(), 0);
    }
}
