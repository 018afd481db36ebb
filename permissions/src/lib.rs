//! Permission records and the permission forest.
//!
//! The management layer stores permissions as flat records, each optionally
//! pointing at a parent. This crate turns a snapshot of those records into a
//! navigable forest ([`PermissionForest`]) and derives menu views from it
//! ([`menu_tree`], [`scoped_menu_tree`]).
//!
//! Nothing here takes part in access decisions; enforcement lives in the
//! `authz` crate. Building a forest is a pure transform over the snapshot and
//! needs no locking.

pub mod error;
pub mod menu;
pub mod record;
pub mod tree;

pub use error::TreeError;
pub use menu::{menu_tree, menu_view, scoped_menu_tree, scoped_menu_view};
pub use record::{Permission, PermissionId, PermissionType, Role};
pub use tree::{PermissionForest, PermissionNode};
