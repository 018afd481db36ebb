//! Menu views over the permission forest.
//!
//! Menus are filtered top-down: a node that fails the filter hides its
//! entire subtree. Deactivating a parent menu therefore removes its children
//! from navigation even when they are active themselves. Their own `active`
//! flags are untouched, and none of this feeds into API enforcement.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::record::{Permission, PermissionId};
use crate::tree::PermissionForest;

/// Builds the menu forest from flat records.
///
/// The full forest is built first so parent cycles are still reported even
/// when they only involve non-menu records.
pub fn menu_tree(records: &[Permission], active_only: bool) -> Result<PermissionForest> {
    let forest = PermissionForest::build(records.to_vec())?;
    Ok(menu_view(&forest, active_only))
}

/// Menu view of an already built forest.
pub fn menu_view(forest: &PermissionForest, active_only: bool) -> PermissionForest {
    forest.prune(|record| record.is_menu() && (record.active || !active_only))
}

/// Active menus restricted to the permission ids granted to a user.
pub fn scoped_menu_tree(
    records: &[Permission],
    granted: &BTreeSet<PermissionId>,
) -> Result<PermissionForest> {
    let forest = PermissionForest::build(records.to_vec())?;
    Ok(scoped_menu_view(&forest, granted))
}

pub fn scoped_menu_view(
    forest: &PermissionForest,
    granted: &BTreeSet<PermissionId>,
) -> PermissionForest {
    forest.prune(|record| record.is_menu() && record.active && granted.contains(&record.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;

    fn codes(forest: &PermissionForest) -> Vec<String> {
        forest
            .flatten()
            .iter()
            .map(|record| record.code.clone())
            .collect()
    }

    fn records() -> Vec<Permission> {
        vec![
            Permission::menu(1, "dashboard").with_sort_order(1),
            Permission::menu(2, "system").with_sort_order(2),
            Permission::menu(3, "user:menu").with_parent(2).with_sort_order(1),
            Permission::menu(4, "role:menu").with_parent(2).with_sort_order(2),
            Permission::button(5, "user:export").with_parent(3),
            Permission::api(6, "user:read", "/api/users"),
        ]
    }

    #[test]
    fn test_menu_tree_keeps_only_menus() {
        let menu = menu_tree(&records(), true).unwrap();
        assert_eq!(codes(&menu), vec!["dashboard", "system", "user:menu", "role:menu"]);
    }

    #[test]
    fn test_inactive_parent_prunes_active_children() {
        let mut records = records();
        records[1].active = false;

        let menu = menu_tree(&records, true).unwrap();
        assert_eq!(codes(&menu), vec!["dashboard"]);
        assert!(!menu.contains(3));
        assert!(!menu.contains(4));

        // The children's own flags are unchanged.
        assert!(records[2].active);
        assert!(records[3].active);
    }

    #[test]
    fn test_inactive_menus_kept_when_not_filtering() {
        let mut records = records();
        records[1].active = false;

        let menu = menu_tree(&records, false).unwrap();
        assert_eq!(codes(&menu), vec!["dashboard", "system", "user:menu", "role:menu"]);
    }

    #[test]
    fn test_inactive_leaf_only_hides_itself() {
        let mut records = records();
        records[3].active = false;

        let menu = menu_tree(&records, true).unwrap();
        assert_eq!(codes(&menu), vec!["dashboard", "system", "user:menu"]);
    }

    #[test]
    fn test_menu_tree_reports_cycles() {
        let records = vec![
            Permission::api(1, "a", "/a").with_parent(2),
            Permission::api(2, "b", "/b").with_parent(1),
            Permission::menu(3, "home"),
        ];
        assert!(matches!(
            menu_tree(&records, true),
            Err(TreeError::Cycle { .. })
        ));
    }

    #[test]
    fn test_scoped_menu_tree() {
        let granted: BTreeSet<PermissionId> = [1, 2, 4].into_iter().collect();
        let menu = scoped_menu_tree(&records(), &granted).unwrap();
        assert_eq!(codes(&menu), vec!["dashboard", "system", "role:menu"]);

        // A granted child under an ungranted parent stays hidden.
        let granted: BTreeSet<PermissionId> = [3].into_iter().collect();
        let menu = scoped_menu_tree(&records(), &granted).unwrap();
        assert!(menu.is_empty());
    }
}
