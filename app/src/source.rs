//! Record sources.
//!
//! The authorization core never talks to persistence directly. Whatever owns
//! role, permission and binding records implements [`RecordSource`], and the
//! application reloads from it on start-up and on [`crate::App::rebuild`].

use async_trait::async_trait;
use authz::{PolicyRule, RoleBinding, RoleInheritance};
use permissions::{Permission, Role};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppError, Result};

/// A snapshot of persisted authorization records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub bindings: Vec<RoleBinding>,
    #[serde(default)]
    pub inheritance: Vec<RoleInheritance>,
    /// Extra rules installed as-is, on top of the bootstrap mode.
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
}

impl SeedData {
    /// Parses YAML, or JSON when `json` is set.
    pub fn parse(content: &str, json: bool) -> Result<Self> {
        if json {
            serde_json::from_str(content).map_err(|e| AppError::Seed(e.to_string()))
        } else {
            serde_yaml::from_str(content).map_err(|e| AppError::Seed(e.to_string()))
        }
    }
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn load(&self) -> Result<SeedData>;
}

/// Reads a YAML or JSON seed file, chosen by extension.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn load(&self) -> Result<SeedData> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Seed(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let json = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let data = SeedData::parse(&content, json)?;

        debug!(
            "Loaded {} roles, {} permissions and {} bindings from {}",
            data.roles.len(),
            data.permissions.len(),
            data.bindings.len(),
            self.path.display()
        );
        Ok(data)
    }
}

/// Serves a fixed snapshot. Used when no seed file is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    data: SeedData,
}

impl StaticRecordSource {
    pub fn new(data: SeedData) -> Self {
        Self { data }
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    async fn load(&self) -> Result<SeedData> {
        Ok(self.data.clone())
    }
}
