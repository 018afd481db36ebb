use rbac_app::{App, AppConfig, BootstrapMode, FileRecordSource};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const SEED: &str = r#"
roles:
  - code: user
    name: User
    permission_ids: [1, 2]
  - code: manager
    name: Manager
    permission_ids: [1, 2, 3, 10, 11]
permissions:
  - id: 1
    code: system
    type: menu
    sort_order: 1
  - id: 2
    code: "system:profile"
    type: menu
    parent_id: 1
    sort_order: 2
  - id: 3
    code: "system:users"
    type: menu
    parent_id: 1
    sort_order: 1
  - id: 10
    code: "user:delete"
    type: api
    path_pattern: /api/users/:id
    parent_id: 3
  - id: 11
    code: "report:read"
    type: api
    path_pattern: /api/reports
bindings:
  - user_id: u1
    role_code: user
"#;

fn write_config(dir: &TempDir, bootstrap: &str) -> std::path::PathBuf {
    fs::write(dir.path().join("seed.yaml"), SEED).unwrap();
    let path = dir.path().join("rbac.yaml");
    fs::write(
        &path,
        format!("bootstrap: {bootstrap}\nseed_file: seed.yaml\n"),
    )
    .unwrap();
    path
}

#[tokio::test]
async fn test_app_from_config_file() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_file(&write_config(&dir, "both")).unwrap();
    assert_eq!(config.bootstrap, BootstrapMode::Both);

    let app = App::from_config(config).await.unwrap();

    // Persisted binding is live before any login.
    assert!(app.engine().enforce("u1", "/api/users/42", "GET").await);
    assert!(!app.engine().enforce("u1", "/api/users/42", "DELETE").await);

    app.login("u2", ["manager"]).await.unwrap();
    assert!(app.engine().enforce("u2", "/api/users/42", "DELETE").await);
    assert!(app.authorize("u2", "report:read").await);
    assert!(!app.authorize("u1", "report:read").await);
}

#[tokio::test]
async fn test_login_replaces_roles() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_file(&write_config(&dir, "defaults")).unwrap();
    let app = App::from_config(config).await.unwrap();

    let delta = app.login("u1", ["manager", " manager ", ""]).await.unwrap();
    assert_eq!(delta.added.iter().collect::<Vec<_>>(), vec!["manager"]);
    assert_eq!(delta.removed.iter().collect::<Vec<_>>(), vec!["user"]);
    assert!(app.authorize("u1", "user:delete").await);

    let delta = app.login("u1", Vec::<String>::new()).await.unwrap();
    assert_eq!(delta.removed.len(), 1);
    assert!(!app.authorize("u1", "user:read").await);
}

#[tokio::test]
async fn test_menus_and_forest() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_file(&write_config(&dir, "records")).unwrap();
    let app = App::from_config(config).await.unwrap();
    app.login("m1", ["manager"]).await.unwrap();

    let forest = app.permission_forest().await;
    assert_eq!(forest.len(), 5);
    assert_eq!(forest.children_of(3).len(), 1);

    let menu: Vec<u64> = app.menu_for("m1").await.flatten().iter().map(|p| p.id).collect();
    assert_eq!(menu, vec![1, 3, 2]);

    let menu: Vec<u64> = app.menu_for("u1").await.flatten().iter().map(|p| p.id).collect();
    assert_eq!(menu, vec![1, 2]);

    let nodes = app.menu_tree(true).await.to_nodes();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].children.len(), 2);
}

#[tokio::test]
async fn test_rebuild_picks_up_file_changes() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "records");
    let seed_path = dir.path().join("seed.yaml");
    let app = App::init(
        AppConfig {
            bootstrap: BootstrapMode::Records,
            ..AppConfig::default()
        },
        Arc::new(FileRecordSource::new(&seed_path)),
    )
    .await
    .unwrap();
    assert!(!app.authorize("u1", "report:read").await);

    fs::write(
        &seed_path,
        SEED.replace("permission_ids: [1, 2]\n", "permission_ids: [1, 2, 11]\n"),
    )
    .unwrap();
    app.rebuild().await.unwrap();
    assert!(app.authorize("u1", "report:read").await);

    // A broken file leaves the running state in place.
    fs::write(&seed_path, "permissions: [{ id: 1 }]\n").unwrap();
    assert!(app.rebuild().await.is_err());
    assert!(app.authorize("u1", "report:read").await);
}
