/*
 * Manages user settings for the tracker: where record collections are stored,
 * where exports are written, and how many entries the recent-activity view
 * shows. Settings persist as `settings.json` in the application's local config
 * directory.
 *
 * It uses a trait-based approach (`ConfigManagerOperations`) so the CLI can be
 * driven by a mock in tests. The concrete `CoreConfigManager` resolves its
 * directory through `path_utils` unless one is supplied explicitly.
 */
use crate::core::path_utils;
use crate::core::query::DEFAULT_RECENT_LIMIT;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration format error: {e}"),
            ConfigError::NoConfigDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            ConfigError::NoConfigDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: None,
            export_dir: None,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_settings(&self) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;
    fn config_dir(&self) -> Option<PathBuf>;
}

pub struct CoreConfigManager {
    app_name: String,
    dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new(app_name: &str) -> Self {
        CoreConfigManager {
            app_name: app_name.to_string(),
            dir_override: None,
        }
    }

    /// Uses `dir` instead of the platform config directory.
    #[cfg(test)]
    pub fn with_dir(app_name: &str, dir: PathBuf) -> Self {
        CoreConfigManager {
            app_name: app_name.to_string(),
            dir_override: Some(dir),
        }
    }

    fn settings_path(&self) -> Result<PathBuf> {
        let dir = self.config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        Ok(dir.join(SETTINGS_FILENAME))
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * Loads settings from `settings.json`. A missing file yields defaults; a file
     * that no longer parses also yields defaults (with a warning) so that a bad
     * hand edit never locks the user out of the tool.
     */
    fn load_settings(&self) -> Result<Settings> {
        log::trace!("CoreConfigManager: Loading settings for app '{}'", self.app_name);
        let file_path = self.settings_path()?;
        if !file_path.exists() {
            log::debug!("CoreConfigManager: Settings file {file_path:?} does not exist.");
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&file_path)?;
        match serde_json::from_str::<Settings>(&contents) {
            Ok(settings) => {
                log::debug!("CoreConfigManager: Loaded settings from {file_path:?}.");
                Ok(settings)
            }
            Err(e) => {
                log::warn!(
                    "CoreConfigManager: Settings file {file_path:?} is unreadable, using defaults: {e}"
                );
                Ok(Settings::default())
            }
        }
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        log::trace!("CoreConfigManager: Saving settings for app '{}'", self.app_name);
        let file_path = self.settings_path()?;
        let file = File::create(&file_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, settings)?;
        log::debug!("CoreConfigManager: Saved settings to {file_path:?}.");
        Ok(())
    }

    fn config_dir(&self) -> Option<PathBuf> {
        match &self.dir_override {
            Some(dir) => path_utils::ensure_dir(dir),
            None => path_utils::get_base_app_config_local_dir(&self.app_name),
        }
    }
}
