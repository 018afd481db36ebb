//! Login-time reconciliation of role bindings.
//!
//! The identity layer decides which roles a user holds; this module makes
//! the policy store agree with it. The rule is a plain set difference applied
//! to every role alike, the superuser role included.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

use crate::error::Result;
use crate::AuthzEngine;

/// The change needed to move a user's bindings from `current` to `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleDelta {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub retained: BTreeSet<String>,
}

impl RoleDelta {
    pub fn between(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            added: desired.difference(current).cloned().collect(),
            removed: current.difference(desired).cloned().collect(),
            retained: current.intersection(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Canonical desired set: trimmed, de-duplicated, empty codes dropped.
pub(crate) fn desired_roles<I, S>(roles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    roles
        .into_iter()
        .map(|role| role.as_ref().trim().to_string())
        .filter(|role| !role.is_empty())
        .collect()
}

/// The service called once per successful authentication.
///
/// It is the only component that writes role bindings on behalf of the
/// identity layer.
#[derive(Clone)]
pub struct RoleSync {
    engine: AuthzEngine,
}

impl RoleSync {
    pub fn new(engine: AuthzEngine) -> Self {
        Self { engine }
    }

    /// Replaces the bindings of `user_id` with `roles`.
    pub async fn on_login<I, S>(&self, user_id: &str, roles: I) -> Result<RoleDelta>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let delta = self.engine.sync_user_roles(user_id, roles).await?;
        if delta.is_empty() {
            info!("Role bindings for {} unchanged", user_id);
        } else {
            info!(
                "Synced role bindings for {}: added {:?}, removed {:?}",
                user_id, delta.added, delta.removed
            );
        }
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_delta_between() {
        let delta = RoleDelta::between(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(delta.added, set(&["c"]));
        assert_eq!(delta.removed, set(&["a"]));
        assert_eq!(delta.retained, set(&["b"]));
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_delta_no_change() {
        let delta = RoleDelta::between(&set(&["a"]), &set(&["a"]));
        assert!(delta.is_empty());
        assert_eq!(delta.retained, set(&["a"]));
    }

    #[test]
    fn test_desired_roles_canonicalized() {
        assert_eq!(desired_roles([" a ", "b", "", "a"]), set(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_on_login_applies_delta() {
        let engine = AuthzEngine::new();
        let sync = RoleSync::new(engine.clone());

        sync.on_login("u1", ["A", "B"]).await.unwrap();
        let delta = sync.on_login("u1", ["B", "C"]).await.unwrap();

        assert_eq!(delta.added, set(&["C"]));
        assert_eq!(delta.removed, set(&["A"]));
        assert_eq!(engine.roles_of("u1").await, set(&["B", "C"]));
    }

    #[tokio::test]
    async fn test_superuser_role_removed_only_when_absent() {
        let engine = AuthzEngine::new();
        let sync = RoleSync::new(engine.clone());

        sync.on_login("root", ["admin", "user"]).await.unwrap();
        sync.on_login("root", ["admin"]).await.unwrap();
        assert_eq!(engine.roles_of("root").await, set(&["admin"]));

        sync.on_login("root", ["user"]).await.unwrap();
        assert_eq!(engine.roles_of("root").await, set(&["user"]));
    }

    #[tokio::test]
    async fn test_on_login_rejects_empty_user() {
        let sync = RoleSync::new(AuthzEngine::new());
        assert!(sync.on_login("", ["user"]).await.is_err());
    }
}
