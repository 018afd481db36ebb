//! Application configuration.
//!
//! Loaded from a YAML file named by `RBAC_CONFIG`; every field has a default
//! so a missing file or a partial one is fine. Relative paths inside the
//! file are resolved against the file's own directory.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Where the initial policy set comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMode {
    /// Only the built-in default rules.
    Defaults,
    /// Only rules derived from role and permission records.
    Records,
    /// Both of the above.
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for daily rolling log files. Console only when unset.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "rbac".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Role code granted the unconditional bypass.
    pub superuser_role: String,
    pub bootstrap: BootstrapMode,
    /// Seed file with roles, permissions and bindings (YAML or JSON).
    pub seed_file: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            superuser_role: authz::SUPERUSER_ROLE.to_string(),
            bootstrap: BootstrapMode::Both,
            seed_file: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses YAML content. Paths are left as written.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file and resolves relative paths against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut config = Self::from_yaml(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    /// Loads configuration from the environment.
    ///
    /// Reads `.env` if present, then `RBAC_CONFIG` (config file path) and
    /// `RBAC_SEED_FILE` (overrides `seed_file`). Relative environment paths
    /// resolve against the current directory.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let cwd = env::current_dir()?;

        let mut config = match env::var("RBAC_CONFIG") {
            Ok(path) => Self::from_file(&resolve(&cwd, Path::new(&path)))?,
            Err(_) => Self::default(),
        };

        if let Ok(seed) = env::var("RBAC_SEED_FILE") {
            config.seed_file = Some(resolve(&cwd, Path::new(&seed)));
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.superuser_role.trim().is_empty() {
            return Err(AppError::Config(
                "superuser_role cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(seed) = &self.seed_file {
            self.seed_file = Some(resolve(base, seed));
        }
        if let Some(directory) = &self.logging.directory {
            self.logging.directory = Some(resolve(base, directory));
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests touching process environment variables must not interleave.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.superuser_role, "admin");
        assert_eq!(config.bootstrap, BootstrapMode::Both);
        assert!(config.seed_file.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = AppConfig::from_yaml("bootstrap: records\n").unwrap();
        assert_eq!(config.bootstrap, BootstrapMode::Records);
        assert_eq!(config.superuser_role, "admin");
        assert_eq!(config.logging.file_prefix, "rbac");
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            AppConfig::from_yaml("bootstrap: sometimes\n"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("superuser_role: ''\n"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rbac.yaml");
        fs::write(
            &path,
            "superuser_role: root\nseed_file: seed.yaml\nlogging:\n  directory: logs\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.superuser_role, "root");
        assert_eq!(config.seed_file, Some(dir.path().join("seed.yaml")));
        assert_eq!(config.logging.directory, Some(dir.path().join("logs")));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::from_file(&dir.path().join("nope.yaml")).is_err());
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rbac.yaml");
        fs::write(&path, "bootstrap: defaults\nseed_file: from-file.yaml\n").unwrap();

        env::set_var("RBAC_CONFIG", &path);
        env::remove_var("RBAC_SEED_FILE");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bootstrap, BootstrapMode::Defaults);
        assert_eq!(config.seed_file, Some(dir.path().join("from-file.yaml")));

        let override_path = dir.path().join("override.yaml");
        env::set_var("RBAC_SEED_FILE", &override_path);
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.seed_file, Some(override_path));

        env::remove_var("RBAC_CONFIG");
        env::remove_var("RBAC_SEED_FILE");
    }
}
