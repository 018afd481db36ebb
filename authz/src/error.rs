//! Error types for the authorization system.
//!
//! # Security Note
//! Only configuration-time operations (adding policies, bindings or role
//! inheritance, translating required permissions) return these errors.
//! Access decisions never do: an unresolvable request is a deny, reported as
//! `false` by [`crate::AuthzEngine::enforce`].

use thiserror::Error;

/// Errors raised by mutations of the policy state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// A resource pattern could not be parsed.
    ///
    /// Patterns are validated when a policy is added, never at decision time.
    #[error("Invalid resource pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An action verb outside `GET`, `POST`, `PATCH`, `DELETE` and `*`.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// An empty subject, user id or role code.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// A required-permission string that is not of the form `resource:verb`.
    #[error("Invalid permission code: {0}")]
    InvalidPermission(String),

    /// Adding the inheritance edge would make a role its own ancestor.
    #[error("Role '{role}' cannot inherit from '{parent}': inheritance cycle")]
    CyclicInheritance { role: String, parent: String },
}

impl AuthzError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::invalid_pattern("api", "must start with '/'");
        assert_eq!(
            err.to_string(),
            "Invalid resource pattern 'api': must start with '/'"
        );

        let err = AuthzError::InvalidAction("PUT".into());
        assert_eq!(err.to_string(), "Invalid action: PUT");

        let err = AuthzError::CyclicInheritance {
            role: "a".into(),
            parent: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "Role 'a' cannot inherit from 'b': inheritance cycle"
        );
    }

    #[test]
    fn test_error_types() {
        let errors = vec![
            AuthzError::invalid_pattern("x", "y"),
            AuthzError::InvalidAction("test".into()),
            AuthzError::InvalidSubject("test".into()),
            AuthzError::InvalidPermission("test".into()),
            AuthzError::CyclicInheritance {
                role: "a".into(),
                parent: "a".into(),
            },
        ];

        for err in errors {
            let _ = format!("{}", err);
            let _ = format!("{:?}", err);
        }
    }
}
