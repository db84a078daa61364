//! Config and data path resolution
//!
//! All tracker files live in a `purser/` directory next to the host binary.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Returns the purser base directory next to the host binary.
///
/// The plugin runs inside the host process, so `current_exe` is the host
/// binary itself:
/// `<host dir>/purser/`
pub fn purser_base_dir() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;

    exe.parent()
        .map(|p| p.join("purser"))
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the config file path.
///
/// Path: `<host dir>/purser/purser.toml`
pub fn config_path() -> ConfigResult<PathBuf> {
    Ok(purser_base_dir()?.join("purser.toml"))
}

/// Returns the timer persistence directory.
///
/// Path: `<host dir>/purser/timers/`
pub fn data_dir() -> ConfigResult<PathBuf> {
    Ok(purser_base_dir()?.join("timers"))
}
