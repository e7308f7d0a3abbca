//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::FleetConfig;

/// Environment variable naming the fleet file when `--config` is absent.
pub const CONFIG_ENV: &str = "FLEET_CONFIG";
/// Fleet file used when neither `--config` nor `FLEET_CONFIG` is set.
pub const DEFAULT_CONFIG_FILE: &str = "fleet.yaml";

/// Production implementation of `ConfigStore` that reads a YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store for `explicit` if given, else `$FLEET_CONFIG`, else
    /// `./fleet.yaml`, else `<user config dir>/fleet/fleet.yaml`.
    #[must_use]
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::new(choose_path(explicit, from_env, dirs::config_dir()))
    }
}

/// The working-directory file wins over the per-user one; when neither
/// exists the working-directory path is kept so the error names it.
fn choose_path(
    explicit: Option<PathBuf>,
    from_env: Option<PathBuf>,
    user_config_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = explicit.or(from_env) {
        return path;
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    user_config_dir
        .map(|dir| dir.join("fleet").join(DEFAULT_CONFIG_FILE))
        .filter(|p| p.is_file())
        .unwrap_or(local)
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<FleetConfig> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read fleet file {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse fleet file {}", self.path.display()))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
