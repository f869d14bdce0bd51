use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides the database location, mostly for tests and scripting.
pub const DB_ENV: &str = "GYMTRACK_DB";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Database file: command-line flag, then `GYMTRACK_DB`, then the config
    /// file's `dbPath`, then the platform default.
    pub fn resolve_db_path(flag: Option<PathBuf>, configured: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(Self::env_db_path)
            .or(configured)
            .or_else(Self::default_db_path)
    }

    pub fn env_db_path() -> Option<PathBuf> {
        std::env::var_os(DB_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    pub fn default_db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("gymtrack");
            Some(state_dir.join("gymtrack.db"))
        } else {
            ProjectDirs::from("", "", "gymtrack")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("gymtrack.db"))
        }
    }
}
