//! # RBAC application
//!
//! Wires the authorization core together: configuration, logging, a record
//! source, the [`AuthzEngine`], login-time role sync and the permission
//! forest used for navigation menus.
//!
//! ```no_run
//! use rbac_app::{App, AppConfig};
//!
//! # async fn example() -> rbac_app::error::Result<()> {
//! let app = App::from_config(AppConfig::from_env()?).await?;
//! app.login("u1", ["user"]).await?;
//! assert!(app.authorize("u1", "user:read").await);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod source;

use authz::required::RequiredPermission;
use authz::{AuthzEngine, PolicySeed, RoleDelta, RoleSync};
use permissions::{menu_view, scoped_menu_view, PermissionForest, PermissionId, Role};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use config::{AppConfig, BootstrapMode, LoggingConfig};
use error::Result;
pub use source::{FileRecordSource, RecordSource, SeedData, StaticRecordSource};

/// Role and permission records as of the last rebuild.
#[derive(Debug, Default)]
struct Catalog {
    roles: Vec<Role>,
    forest: PermissionForest,
}

/// The assembled authorization service.
pub struct App {
    config: AppConfig,
    engine: AuthzEngine,
    sync: RoleSync,
    source: Arc<dyn RecordSource>,
    catalog: RwLock<Catalog>,
}

impl App {
    /// Builds the service and loads the initial state from `source`.
    pub async fn init(config: AppConfig, source: Arc<dyn RecordSource>) -> Result<Self> {
        config.validate()?;
        let engine = AuthzEngine::with_superuser_role(&config.superuser_role);
        let app = Self {
            sync: RoleSync::new(engine.clone()),
            engine,
            config,
            source,
            catalog: RwLock::new(Catalog::default()),
        };
        app.load(true).await?;
        Ok(app)
    }

    /// Uses the configured seed file, or an empty record set when there is none.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let source: Arc<dyn RecordSource> = match &config.seed_file {
            Some(path) => Arc::new(FileRecordSource::new(path)),
            None => Arc::new(StaticRecordSource::default()),
        };
        Self::init(config, source).await
    }

    /// Reloads records and replaces policies, inheritance and the permission
    /// forest.
    ///
    /// Role bindings are kept as the logins left them; persisted bindings are
    /// only read at start-up. Nothing changes if loading or validation fails.
    pub async fn rebuild(&self) -> Result<()> {
        self.load(false).await
    }

    async fn load(&self, with_bindings: bool) -> Result<()> {
        let data = self.source.load().await?;
        let forest = PermissionForest::build(data.permissions.clone())?;

        let mut seed = match self.config.bootstrap {
            BootstrapMode::Defaults => PolicySeed::defaults()?,
            BootstrapMode::Records => PolicySeed::from_records(&data.roles, &data.permissions)?,
            BootstrapMode::Both => PolicySeed::defaults()?
                .merge(PolicySeed::from_records(&data.roles, &data.permissions)?),
        };
        seed.policies.extend(data.policies);
        let seed = seed
            .with_bindings(data.bindings)
            .with_inheritance(data.inheritance);

        // Catalog lock first, engine second; menu_for takes them in the same order
        let mut catalog = self.catalog.write().await;
        if with_bindings {
            self.engine.rebuild(&seed).await?;
        } else {
            self.engine.reload_policies(&seed).await?;
        }
        *catalog = Catalog {
            roles: data.roles,
            forest,
        };
        info!("Application state rebuilt ({:?} bootstrap)", self.config.bootstrap);
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn engine(&self) -> &AuthzEngine {
        &self.engine
    }

    /// Replaces the user's role bindings with the roles presented at login.
    pub async fn login<I, S>(&self, user_id: &str, roles: I) -> Result<RoleDelta>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.sync.on_login(user_id, roles).await?)
    }

    /// Checks a declared `resource:verb` permission for `user_id`.
    ///
    /// Malformed codes and verbs without an HTTP action are denied.
    pub async fn authorize(&self, user_id: &str, required: &str) -> bool {
        let required: RequiredPermission = match required.parse() {
            Ok(required) => required,
            Err(e) => {
                warn!("Denied {}: {}", user_id, e);
                return false;
            }
        };
        let Some((path, action)) = required.to_request() else {
            debug!("Denied {} {}: verb has no action", user_id, required);
            return false;
        };
        self.engine.enforce(user_id, &path, action.as_str()).await
    }

    /// The active menu entries visible to `user_id`.
    ///
    /// The superuser sees every active menu; everyone else sees the menus
    /// granted to their active effective roles.
    pub async fn menu_for(&self, user_id: &str) -> PermissionForest {
        let catalog = self.catalog.read().await;
        let roles = self.engine.effective_roles(user_id).await;

        if roles.contains(self.engine.superuser_role()) {
            return menu_view(&catalog.forest, true);
        }

        let granted: BTreeSet<PermissionId> = catalog
            .roles
            .iter()
            .filter(|role| role.active && roles.contains(&role.code))
            .flat_map(|role| role.permission_ids.iter().copied())
            .collect();
        scoped_menu_view(&catalog.forest, &granted)
    }

    /// The full permission forest.
    pub async fn permission_forest(&self) -> PermissionForest {
        self.catalog.read().await.forest.clone()
    }

    /// All menu entries, optionally restricted to active ones.
    pub async fn menu_tree(&self, active_only: bool) -> PermissionForest {
        menu_view(&self.catalog.read().await.forest, active_only)
    }
}
