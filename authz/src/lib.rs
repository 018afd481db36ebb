//! Role-based authorization engine.
//!
//! This crate decides whether a subject (a user id or a role code) may
//! perform an action on a resource path. Policies are allow rules
//! `(subject, resource pattern, action)`; users reach roles through bindings
//! and, optionally, role inheritance.
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the HTTP layer, which authenticates the user
//! 2. **Login** pushes the user's roles into the engine through [`RoleSync`]
//! 3. **Protected operation** translates its declared permission into a
//!    path and action ([`required::RequiredPermission`])
//! 4. **[`AuthzEngine::enforce`]** evaluates the request against one
//!    consistent snapshot of the policy state
//! 5. **Decision** is a plain `bool`: allow, or deny
//!
//! # Decision rules
//!
//! - A user holding the superuser role is allowed everything, before any
//!   policy is consulted. This bypass is not a policy and cannot be removed
//!   by policy edits.
//! - Otherwise the request is allowed when at least one rule held by the
//!   user or one of their effective roles matches the path and the action.
//! - Everything else is a deny, including empty subjects, unknown action
//!   verbs and malformed paths. `enforce` never fails.
//!
//! # Concurrency
//!
//! The policy store and the role graph sit behind a single read-write lock.
//! A decision holds the read side for its whole evaluation; every mutation
//! holds the write side for its whole duration, so a decision never sees a
//! half-applied sync.

pub mod bootstrap;
pub mod error;
pub mod graph;
pub mod pattern;
pub mod required;
pub mod store;
pub mod sync;
pub mod types;

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub use bootstrap::{PolicySeed, SUPERUSER_ROLE};
use error::Result;
use graph::RoleGraph;
use pattern::split_request_path;
use store::PolicyStore;
pub use sync::{RoleDelta, RoleSync};
pub use types::{Action, PolicyRule, RoleBinding, RoleInheritance};

/// The policy store and role graph, always guarded together.
#[derive(Debug, Default)]
struct PolicyState {
    store: PolicyStore,
    graph: RoleGraph,
}

impl PolicyState {
    fn from_seed(seed: &PolicySeed) -> Result<Self> {
        let mut state = Self::default();
        for rule in &seed.policies {
            let rule = PolicyRule::new(&rule.subject, rule.pattern.as_str(), rule.action.as_str())?;
            state.store.add_policy(&rule);
        }
        for binding in &seed.bindings {
            state
                .store
                .add_role_binding(&binding.user_id, &binding.role_code)?;
        }
        for edge in &seed.inheritance {
            state.graph.add_inheritance(&edge.role, &edge.inherits)?;
        }
        Ok(state)
    }
}

/// The authorization engine.
///
/// Cloning is cheap and every clone shares the same policy state, so one
/// engine built at the composition root can be handed to every component
/// that needs it.
///
/// # Example
///
/// ```rust
/// use authz::{AuthzEngine, PolicySeed};
///
/// # async fn demo() -> authz::error::Result<()> {
/// let engine = AuthzEngine::new();
/// engine.rebuild(&PolicySeed::defaults()?).await?;
/// engine.sync_user_roles("u1", ["user"]).await?;
///
/// assert!(engine.enforce("u1", "/api/users/7", "GET").await);
/// assert!(!engine.enforce("u1", "/api/users/7", "DELETE").await);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthzEngine {
    state: Arc<RwLock<PolicyState>>,
    superuser_role: Arc<str>,
}

impl AuthzEngine {
    /// Creates an empty engine using [`SUPERUSER_ROLE`] as the bypass role.
    pub fn new() -> Self {
        Self::with_superuser_role(SUPERUSER_ROLE)
    }

    /// Creates an empty engine with a custom bypass role code.
    pub fn with_superuser_role(role_code: &str) -> Self {
        Self {
            state: Arc::new(RwLock::new(PolicyState::default())),
            superuser_role: Arc::from(role_code.trim()),
        }
    }

    pub fn superuser_role(&self) -> &str {
        &self.superuser_role
    }

    /// Decides whether `subject` may perform `action` on `resource`.
    pub async fn enforce(&self, subject: &str, resource: &str, action: &str) -> bool {
        let subject = subject.trim();
        if subject.is_empty() {
            debug!("Denied {} {}: empty subject", action, resource);
            return false;
        }

        let state = self.state.read().await;
        let roles = state.graph.effective_roles(&state.store, subject);

        if !self.superuser_role.is_empty() && roles.contains(&*self.superuser_role) {
            debug!(
                "Allowed {} {} {}: superuser role '{}'",
                subject, action, resource, self.superuser_role
            );
            return true;
        }

        let Ok(requested) = action.parse::<Action>() else {
            debug!("Denied {} {} {}: unknown action", subject, action, resource);
            return false;
        };
        let Some(segments) = split_request_path(resource) else {
            debug!("Denied {} {} {}: malformed resource path", subject, action, resource);
            return false;
        };

        let candidates = std::iter::once(subject).chain(roles.iter().map(String::as_str));
        for candidate in candidates {
            if let Some(grant) = state
                .store
                .grants_for(candidate)
                .find(|grant| grant.matches(&segments, requested))
            {
                debug!(
                    "Allowed {} {} {} via ({}, {}, {})",
                    subject, requested, resource, candidate, grant.pattern, grant.action
                );
                return true;
            }
        }

        debug!("Denied {} {} {}: no matching policy", subject, requested, resource);
        false
    }

    /// Adds an allow rule. Returns `false` when it already existed.
    ///
    /// Malformed patterns, unknown actions and empty subjects are rejected
    /// here so that decisions never encounter them.
    pub async fn add_policy(&self, subject: &str, pattern: &str, action: &str) -> Result<bool> {
        let rule = PolicyRule::new(subject, pattern, action)?;
        let added = self.state.write().await.store.add_policy(&rule);
        if added {
            info!("Added policy {}", rule);
        }
        Ok(added)
    }

    /// Removes an allow rule. Returns `false` when it was absent.
    pub async fn remove_policy(&self, subject: &str, pattern: &str, action: &str) -> Result<bool> {
        let rule = PolicyRule::new(subject, pattern, action)?;
        let removed = self.state.write().await.store.remove_policy(&rule);
        if removed {
            info!("Removed policy {}", rule);
        }
        Ok(removed)
    }

    pub async fn add_role_binding(&self, user_id: &str, role_code: &str) -> Result<bool> {
        self.state
            .write()
            .await
            .store
            .add_role_binding(user_id, role_code)
    }

    pub async fn remove_role_binding(&self, user_id: &str, role_code: &str) -> bool {
        self.state
            .write()
            .await
            .store
            .remove_role_binding(user_id, role_code)
    }

    /// Direct role bindings of `user_id`.
    pub async fn roles_of(&self, user_id: &str) -> BTreeSet<String> {
        self.state.read().await.store.roles_of(user_id.trim())
    }

    /// Direct bindings plus inherited roles.
    pub async fn effective_roles(&self, user_id: &str) -> BTreeSet<String> {
        let state = self.state.read().await;
        state.graph.effective_roles(&state.store, user_id.trim())
    }

    /// Makes `role` inherit everything granted to `parent`.
    pub async fn add_role_inheritance(&self, role: &str, parent: &str) -> Result<bool> {
        self.state.write().await.graph.add_inheritance(role, parent)
    }

    pub async fn remove_role_inheritance(&self, role: &str, parent: &str) -> bool {
        self.state
            .write()
            .await
            .graph
            .remove_inheritance(role, parent)
    }

    /// Replaces the direct bindings of `user_id` with `roles`.
    ///
    /// The difference is computed and applied under one write lock, so a
    /// concurrent decision observes either the old or the new role set.
    pub async fn sync_user_roles<I, S>(&self, user_id: &str, roles: I) -> Result<RoleDelta>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let user_id = types::validate_identifier(user_id, "user id")?;
        let desired = sync::desired_roles(roles);

        let mut state = self.state.write().await;
        let delta = RoleDelta::between(&state.store.roles_of(&user_id), &desired);
        for role in &delta.removed {
            state.store.remove_role_binding(&user_id, role);
        }
        for role in &delta.added {
            state.store.add_role_binding(&user_id, role)?;
        }
        Ok(delta)
    }

    /// Replaces the whole policy state with one built from `seed`.
    ///
    /// The new state is built before the lock is taken; on error the current
    /// state is left untouched.
    pub async fn rebuild(&self, seed: &PolicySeed) -> Result<()> {
        let fresh = PolicyState::from_seed(seed)?;
        let policies = fresh.store.policy_count();
        let bindings = fresh.store.bindings().len();

        *self.state.write().await = fresh;
        info!(
            "Policy state rebuilt: {} policies, {} bindings, {} inheritance edges",
            policies,
            bindings,
            seed.inheritance.len()
        );
        Ok(())
    }

    /// Replaces rules and inheritance from `seed`, leaving role bindings as
    /// they are. Bindings in `seed` are ignored.
    pub async fn reload_policies(&self, seed: &PolicySeed) -> Result<()> {
        let fresh = PolicyState::from_seed(&PolicySeed {
            bindings: Vec::new(),
            ..seed.clone()
        })?;
        let policies = fresh.store.policy_count();

        let mut state = self.state.write().await;
        state.store.replace_policies(fresh.store);
        state.graph = fresh.graph;
        info!(
            "Policies reloaded: {} policies, {} inheritance edges; bindings kept",
            policies,
            seed.inheritance.len()
        );
        Ok(())
    }

    /// All rules, sorted.
    pub async fn policies(&self) -> Vec<PolicyRule> {
        self.state.read().await.store.policies()
    }

    /// All bindings, sorted.
    pub async fn bindings(&self) -> Vec<RoleBinding> {
        self.state.read().await.store.bindings()
    }

    /// All inheritance edges, sorted.
    pub async fn inheritance(&self) -> Vec<RoleInheritance> {
        self.state.read().await.graph.edges()
    }
}

impl Default for AuthzEngine {
    fn default() -> Self {
        Self::new()
    }
}
