mod config;
pub mod habit_db;
pub mod migrations;
pub mod presets;

pub use config::{AnalyticsConfig, Config, LoggingConfig, StorageConfig};
pub use habit_db::HabitStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `HABITRACK_DATA_DIR` wins when set. Otherwise `~/.config/habitrack/`, or
/// `~/.config/habitrack-dev/` when `HABITRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = data_dir_path();
    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Resolve the data directory without touching the filesystem.
pub fn data_dir_path() -> PathBuf {
    match std::env::var_os("HABITRACK_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("HABITRACK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("habitrack-dev")
            } else {
                base_dir.join("habitrack")
            }
        }
    }
}
