/*
 * This module resolves (and creates on demand) the per-user directories the
 * tracker keeps its files in: the local data directory holding the record
 * collections and the local config directory holding settings and the log file.
 * Both are derived from `ProjectDirs` without an organization qualifier.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "IpoTracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppDirKind {
    ConfigLocal,
    DataLocal,
}

/*
 * Returns the directory, creating it if it does not exist yet. `None` means the
 * directory could not be determined or created; callers treat that as "no
 * storage available" rather than as a fatal condition.
 */
pub fn ensure_dir(dir: &Path) -> Option<PathBuf> {
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(dir) {
            log::error!("PathUtils: Failed to create directory {dir:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created directory: {dir:?}");
    } else {
        log::trace!("PathUtils: Directory already exists: {dir:?}");
    }
    Some(dir.to_path_buf())
}

fn get_base_app_dir(app_name: &str, kind: AppDirKind) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving {kind:?} dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let path = match kind {
            AppDirKind::ConfigLocal => proj_dirs.config_local_dir(),
            AppDirKind::DataLocal => proj_dirs.data_local_dir(),
        };
        ensure_dir(path)
    })
}

/// Local (non-roaming) configuration directory, e.g. where `settings.json` lives.
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    get_base_app_dir(app_name, AppDirKind::ConfigLocal)
}

/// Local data directory that holds the record collections by default.
pub fn get_base_app_data_local_dir(app_name: &str) -> Option<PathBuf> {
    get_base_app_dir(app_name, AppDirKind::DataLocal)
}
