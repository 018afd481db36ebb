use anyhow::Result;
use rbac_app::{App, AppConfig};
use std::path::Path;
use tracing::debug;

/// Resolves the configuration from the command line.
///
/// `--config` and `--seed` already fall back to `RBAC_CONFIG` and
/// `RBAC_SEED_FILE` through clap. Without a config file the defaults apply.
pub fn load_config(config: Option<&Path>, seed: Option<&Path>) -> Result<AppConfig> {
    let mut app_config = match config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(seed) = seed {
        app_config.seed_file = Some(seed.to_path_buf());
    }

    Ok(app_config)
}

/// Syncs `roles` for `user` when the caller asked for a simulated login.
pub async fn apply_login(app: &App, user: &str, roles: Option<Vec<String>>) -> Result<()> {
    if let Some(roles) = roles {
        let delta = app.login(user, &roles).await?;
        debug!("Simulated login for {}: {:?}", user, delta);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_seed_flag_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rbac.yaml");
        fs::write(&path, "seed_file: seed.yaml\n").unwrap();

        let config = load_config(Some(path.as_path()), None).unwrap();
        assert_eq!(config.seed_file, Some(dir.path().join("seed.yaml")));

        let config = load_config(Some(path.as_path()), Some(Path::new("/tmp/other.json"))).unwrap();
        assert_eq!(config.seed_file.as_deref(), Some(Path::new("/tmp/other.json")));
    }
}
