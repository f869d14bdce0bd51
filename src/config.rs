use crate::model::DEFAULT_TARGET_REST_SECS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides where the config file lives.
pub const CONFIG_ENV: &str = "GYMTRACK_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Rest length used when neither the exercise nor the command says otherwise.
    pub default_rest_secs: u32,
    pub db_path: Option<PathBuf>,
    pub tick_interval_ms: u64,
    /// Ring the terminal bell when a rest runs out.
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_rest_secs: DEFAULT_TARGET_REST_SECS,
            db_path: None,
            tick_interval_ms: 1000,
            sound: true,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(p) = std::env::var_os(CONFIG_ENV) {
            PathBuf::from(p)
        } else if let Some(pd) = ProjectDirs::from("", "", "gymtrack") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("gymtrack_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
