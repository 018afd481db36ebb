//! Initial policy state.
//!
//! The in-memory policy state is a cache. At start-up it is rebuilt from a
//! [`PolicySeed`]: the fixed default rule set, rules derived from persisted
//! role and permission records, or both.

use permissions::{Permission, PermissionId, PermissionType, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::required::verb_action;
use crate::types::{Action, PolicyRule, RoleBinding, RoleInheritance};

/// Role code of the built-in superuser.
pub const SUPERUSER_ROLE: &str = "admin";

/// Rules installed by a fresh deployment.
const DEFAULT_POLICIES: &[(&str, &str, &str)] = &[
    (SUPERUSER_ROLE, "*", "*"),
    // Read-only access to profile and listing resources.
    ("user", "/api/auth/profile", "GET"),
    ("user", "/api/users/profile/*", "*"),
    ("user", "/api/users", "GET"),
    ("user", "/api/users/:id", "GET"),
    ("user", "/api/roles", "GET"),
    ("user", "/api/roles/:id", "GET"),
    ("user", "/api/permissions", "GET"),
    // Managers administer users and roles.
    ("manager", "/api/users", "*"),
    ("manager", "/api/users/:id", "*"),
    ("manager", "/api/roles", "*"),
    ("manager", "/api/roles/:id", "*"),
    ("manager", "/api/permissions", "GET"),
];

/// Everything needed to rebuild the policy state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySeed {
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
    #[serde(default)]
    pub bindings: Vec<RoleBinding>,
    #[serde(default)]
    pub inheritance: Vec<RoleInheritance>,
}

impl PolicySeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default rule set.
    pub fn defaults() -> Result<Self> {
        let policies = DEFAULT_POLICIES
            .iter()
            .map(|(subject, pattern, action)| PolicyRule::new(subject, pattern, action))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            policies,
            ..Self::default()
        })
    }

    /// Derives rules from role and permission records.
    ///
    /// Every active role yields one rule per active API permission it owns
    /// that carries a path pattern. The action comes from the verb of the
    /// permission code (`user:read` is `GET`); codes without a known verb
    /// grant every action on the pattern. A malformed pattern fails the
    /// whole derivation.
    pub fn from_records(roles: &[Role], permissions: &[Permission]) -> Result<Self> {
        let by_id: HashMap<PermissionId, &Permission> = permissions
            .iter()
            .map(|permission| (permission.id, permission))
            .collect();

        let mut policies = Vec::new();
        for role in roles.iter().filter(|role| role.active) {
            for id in &role.permission_ids {
                let Some(permission) = by_id.get(id) else {
                    warn!("Role {} references unknown permission {}", role.code, id);
                    continue;
                };
                if !permission.active || permission.kind != PermissionType::Api {
                    continue;
                }
                let Some(pattern) = permission.path_pattern.as_deref() else {
                    continue;
                };
                let action = permission_action(&permission.code);
                policies.push(PolicyRule::new(&role.code, pattern, action.as_str())?);
            }
        }

        debug!(
            "Derived {} policies from {} roles and {} permissions",
            policies.len(),
            roles.len(),
            permissions.len()
        );
        Ok(Self {
            policies,
            ..Self::default()
        })
    }

    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = RoleBinding>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    pub fn with_inheritance(
        mut self,
        inheritance: impl IntoIterator<Item = RoleInheritance>,
    ) -> Self {
        self.inheritance.extend(inheritance);
        self
    }

    /// Appends everything in `other`. Duplicates collapse when applied.
    pub fn merge(mut self, other: PolicySeed) -> Self {
        self.policies.extend(other.policies);
        self.bindings.extend(other.bindings);
        self.inheritance.extend(other.inheritance);
        self
    }
}

fn permission_action(code: &str) -> Action {
    code.split_once(':')
        .and_then(|(_, verb)| verb_action(verb))
        .unwrap_or(Action::Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let seed = PolicySeed::defaults().unwrap();
        assert_eq!(seed.policies.len(), DEFAULT_POLICIES.len());
        assert!(seed
            .policies
            .iter()
            .any(|rule| rule.subject == SUPERUSER_ROLE && rule.pattern.is_universal()));
        assert!(seed.bindings.is_empty());
    }

    #[test]
    fn test_from_records() {
        let permissions = vec![
            Permission::menu(1, "system"),
            Permission::api(2, "user:read", "/api/users"),
            Permission::api(3, "user:delete", "/api/users/:id"),
            Permission::api(4, "user:assignRoles", "/api/users/:id/roles"),
            Permission::api(5, "role:read", "/api/roles").with_active(false),
            Permission::new(6, "user:export", PermissionType::Api),
        ];
        let roles = vec![
            Role::new("user").with_permissions([1, 2, 5, 6, 99]),
            Role::new("manager").with_permissions([2, 3, 4]),
            Role::new("retired").with_permissions([2]).with_active(false),
        ];

        let seed = PolicySeed::from_records(&roles, &permissions).unwrap();
        let mut rendered: Vec<String> = seed.policies.iter().map(ToString::to_string).collect();
        rendered.sort();
        assert_eq!(
            rendered,
            vec![
                "(manager, /api/users, GET)",
                "(manager, /api/users/:id, DELETE)",
                "(manager, /api/users/:id/roles, *)",
                "(user, /api/users, GET)",
            ]
        );
    }

    #[test]
    fn test_from_records_rejects_malformed_pattern() {
        let permissions = vec![Permission::api(1, "user:read", "api/users")];
        let roles = vec![Role::new("user").with_permissions([1])];
        assert!(PolicySeed::from_records(&roles, &permissions).is_err());
    }

    #[test]
    fn test_merge_and_bindings() {
        let seed = PolicySeed::defaults()
            .unwrap()
            .merge(PolicySeed::new().with_bindings([RoleBinding::new("u1", "user")]))
            .with_inheritance([RoleInheritance::new("manager", "user")]);
        assert_eq!(seed.bindings.len(), 1);
        assert_eq!(seed.inheritance.len(), 1);
        assert_eq!(seed.policies.len(), DEFAULT_POLICIES.len());
    }
}
