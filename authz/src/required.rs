//! Translation of declared permission codes into enforceable requests.
//!
//! Protected operations declare what they need as `resource:verb`
//! (`"user:create"`, `"role:read"`). The enforcer only understands paths and
//! HTTP verbs, so callers convert first: the resource becomes the collection
//! path `/api/{resource}s` and the verb maps to an [`Action`].

use std::fmt;
use std::str::FromStr;

use crate::error::{AuthzError, Result};
use crate::types::Action;

/// A parsed `resource:verb` permission code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequiredPermission {
    pub resource: String,
    pub verb: String,
}

impl RequiredPermission {
    /// The collection path guarded by this permission.
    pub fn resource_path(&self) -> String {
        format!("/api/{}s", self.resource)
    }

    /// The HTTP action for the verb, if it has one.
    ///
    /// Verbs without a translation (`assignRoles`, `export`, ...) return
    /// `None`; callers must treat that as a deny.
    pub fn action(&self) -> Option<Action> {
        verb_action(&self.verb)
    }

    /// `(resource_path, action)` ready for [`crate::AuthzEngine::enforce`].
    pub fn to_request(&self) -> Option<(String, Action)> {
        self.action().map(|action| (self.resource_path(), action))
    }
}

impl FromStr for RequiredPermission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        let (resource, verb) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidPermission(s.to_string()))?;

        let valid = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !valid(resource) || !valid(verb) {
            return Err(AuthzError::InvalidPermission(s.to_string()));
        }

        Ok(Self {
            resource: resource.to_string(),
            verb: verb.to_string(),
        })
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.verb)
    }
}

/// Maps a permission verb to its HTTP action.
pub fn verb_action(verb: &str) -> Option<Action> {
    match verb.to_ascii_lowercase().as_str() {
        "create" => Some(Action::Post),
        "read" | "list" | "view" => Some(Action::Get),
        "update" => Some(Action::Patch),
        "delete" | "remove" => Some(Action::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_translate() {
        let required: RequiredPermission = "user:create".parse().unwrap();
        assert_eq!(required.resource, "user");
        assert_eq!(required.verb, "create");
        assert_eq!(
            required.to_request(),
            Some(("/api/users".to_string(), Action::Post))
        );
        assert_eq!(required.to_string(), "user:create");
    }

    #[test]
    fn test_verb_mapping() {
        let cases = [
            ("role:read", Action::Get),
            ("role:list", Action::Get),
            ("permission:update", Action::Patch),
            ("user:delete", Action::Delete),
            ("user:REMOVE", Action::Delete),
        ];
        for (code, expected) in cases {
            let required: RequiredPermission = code.parse().unwrap();
            assert_eq!(required.action(), Some(expected), "{code}");
        }
    }

    #[test]
    fn test_untranslatable_verb() {
        let required: RequiredPermission = "user:assignRoles".parse().unwrap();
        assert_eq!(required.action(), None);
        assert_eq!(required.to_request(), None);
    }

    #[test]
    fn test_malformed_codes() {
        for code in ["", "user", ":read", "user:", "user:read:extra", "us er:read"] {
            assert!(
                code.parse::<RequiredPermission>().is_err(),
                "'{code}' should be rejected"
            );
        }
    }
}
