//! Error types for permission forest construction.

use thiserror::Error;

use crate::record::PermissionId;

/// Errors raised while building a permission forest from flat records.
///
/// Both variants are configuration errors: the records handed over by the
/// management layer are inconsistent and no forest is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A permission is its own transitive ancestor.
    #[error("Permission {id} is part of a parent cycle")]
    Cycle { id: PermissionId },

    /// Two records share the same id.
    #[error("Duplicate permission id: {0}")]
    DuplicateId(PermissionId),
}

/// A specialized Result type for permission tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
