//! Core authorization types.
//!
//! A policy is an allow rule `(subject, resource pattern, action)`. The
//! subject is either a user id or a role code; both are opaque strings here.
//! Everything in this module is validated on construction, so a value that
//! exists is safe to store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthzError, Result};
use crate::pattern::ResourcePattern;

/// The action part of a policy or a request.
///
/// Parsed case-insensitively and rendered uppercase, so `"get"` and `"GET"`
/// are the same action once they pass the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    Get,
    Post,
    Patch,
    Delete,
    /// `*`: in a policy, matches any requested action.
    Any,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "GET",
            Action::Post => "POST",
            Action::Patch => "PATCH",
            Action::Delete => "DELETE",
            Action::Any => "*",
        }
    }

    /// Whether a policy carrying `self` covers a request for `requested`.
    pub fn permits(&self, requested: Action) -> bool {
        *self == Action::Any || *self == requested
    }
}

impl FromStr for Action {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Action::Get),
            "POST" => Ok(Action::Post),
            "PATCH" => Ok(Action::Patch),
            "DELETE" => Ok(Action::Delete),
            "*" => Ok(Action::Any),
            _ => Err(AuthzError::InvalidAction(s.to_string())),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An allow rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPolicyRule")]
pub struct PolicyRule {
    /// User id or role code.
    pub subject: String,
    pub pattern: ResourcePattern,
    pub action: Action,
}

impl PolicyRule {
    /// Parses and validates a rule from raw strings.
    pub fn new(subject: &str, pattern: &str, action: &str) -> Result<Self> {
        Ok(Self {
            subject: validate_identifier(subject, "policy subject")?,
            pattern: ResourcePattern::parse(pattern)?,
            action: action.parse()?,
        })
    }

    /// The `(pattern, action)` half of the rule.
    pub fn grant(&self) -> Grant {
        Grant {
            pattern: self.pattern.clone(),
            action: self.action,
        }
    }
}

/// Wire form of a [`PolicyRule`] before validation.
#[derive(Deserialize)]
struct RawPolicyRule {
    subject: String,
    pattern: String,
    action: String,
}

impl TryFrom<RawPolicyRule> for PolicyRule {
    type Error = AuthzError;

    fn try_from(raw: RawPolicyRule) -> Result<Self> {
        Self::new(&raw.subject, &raw.pattern, &raw.action)
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.pattern, self.action)
    }
}

/// What a subject is allowed: a resource pattern and an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grant {
    pub pattern: ResourcePattern,
    pub action: Action,
}

impl Grant {
    pub fn matches(&self, resource: &[&str], action: Action) -> bool {
        self.action.permits(action) && self.pattern.matches_segments(resource)
    }
}

/// A user to role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleBinding {
    pub user_id: String,
    pub role_code: String,
}

impl RoleBinding {
    pub fn new(user_id: impl Into<String>, role_code: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_code: role_code.into(),
        }
    }
}

/// A role to role inheritance edge: `role` receives everything `inherits` has.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleInheritance {
    pub role: String,
    pub inherits: String,
}

impl RoleInheritance {
    pub fn new(role: impl Into<String>, inherits: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            inherits: inherits.into(),
        }
    }
}

/// Trims an identifier and rejects it when empty.
pub(crate) fn validate_identifier(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthzError::InvalidSubject(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
