// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref DECK_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where the active deck comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file was found; the deck compiled into the binary is used.
    Embedded,
}

/// Returns the path to the launchdeck configuration directory (`~/.config/launchdeck`).
/// Creates it if it doesn't exist.
///
/// Memoized: the first call computes and caches the path.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached_path_guard = DECK_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());

    if let Some(path) = &*cached_path_guard {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached_path_guard = Some(config_path.clone());
    Ok(config_path)
}

/// Path of the per-user deck file, without touching the filesystem.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILENAME))
}

/// Picks the deck file to load.
///
/// Order: explicit `--config`, the `LAUNCHDECK_CONFIG` value, `./launchdeck.toml`,
/// the per-user file. An explicit path or env value is returned even if the file
/// is missing so that loading reports it; the discovered locations are only used
/// when they exist.
pub fn resolve_config_source(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    cwd: &Path,
    user_path: Option<&Path>,
) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::File(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return ConfigSource::File(PathBuf::from(value));
    }

    let local = cwd.join(CONFIG_FILENAME);
    if local.is_file() {
        return ConfigSource::File(local);
    }

    match user_path {
        Some(path) if path.is_file() => ConfigSource::File(path.to_path_buf()),
        _ => ConfigSource::Embedded,
    }
}

/// Name used for `<deck::project>`: the last component of the working directory.
pub fn project_name(cwd: &Path) -> String {
    cwd.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}
