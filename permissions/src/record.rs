//! Flat permission and role records as supplied by the management layer.
//!
//! These are plain data. Parent/child structure is derived on demand by
//! [`crate::tree::PermissionForest`]; nothing here holds a live reference to
//! another record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a permission record.
pub type PermissionId = u64;

/// What a permission record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    /// A navigation entry.
    Menu,
    /// An API endpoint. Only this type carries an enforceable path pattern.
    Api,
    /// A button or other in-page control.
    Button,
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionType::Menu => "menu",
            PermissionType::Api => "api",
            PermissionType::Button => "button",
        };
        f.write_str(name)
    }
}

/// A single permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,

    /// Stable code, e.g. `"user:create"` or `"system"`.
    pub code: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: PermissionType,

    /// Resource pattern enforced for API permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,

    /// Parent record, if any. Lookup-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PermissionId>,

    #[serde(default)]
    pub sort_order: i32,

    #[serde(default = "default_active")]
    pub active: bool,

    /// Front-end route for menu entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Front-end component for menu entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Permission {
    /// Creates an active permission with no parent and sort order 0.
    pub fn new(id: PermissionId, code: impl Into<String>, kind: PermissionType) -> Self {
        let code = code.into();
        Self {
            id,
            name: code.clone(),
            code,
            kind,
            path_pattern: None,
            parent_id: None,
            sort_order: 0,
            active: true,
            route: None,
            component: None,
            icon: None,
        }
    }

    /// Creates a menu permission.
    pub fn menu(id: PermissionId, code: impl Into<String>) -> Self {
        Self::new(id, code, PermissionType::Menu)
    }

    /// Creates an API permission enforcing `pattern`.
    pub fn api(id: PermissionId, code: impl Into<String>, pattern: impl Into<String>) -> Self {
        let mut permission = Self::new(id, code, PermissionType::Api);
        permission.path_pattern = Some(pattern.into());
        permission
    }

    /// Creates a button permission.
    pub fn button(id: PermissionId, code: impl Into<String>) -> Self {
        Self::new(id, code, PermissionType::Button)
    }

    pub fn with_parent(mut self, parent_id: PermissionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_menu(&self) -> bool {
        self.kind == PermissionType::Menu
    }
}

/// A role record. The code is the role's identity in policies and bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub permission_ids: BTreeSet<PermissionId>,
}

impl Role {
    /// Creates an active role without permissions.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            description: None,
            active: true,
            permission_ids: BTreeSet::new(),
        }
    }

    pub fn with_permissions(mut self, ids: impl IntoIterator<Item = PermissionId>) -> Self {
        self.permission_ids.extend(ids);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

fn default_active() -> bool {
    true
}
