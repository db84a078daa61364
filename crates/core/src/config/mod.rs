//! Configuration for the tracker
//!
//! A single TOML file holds the feature flags and window state. The plugin
//! reads flags at any time; writes happen only from the host's settings UI
//! path, which saves and then broadcasts a state re-evaluation to the
//! timer managers.

mod loader;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use loader::{config_path, data_dir, purser_base_dir};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine config directory from host location
    #[error("Config directory not available - could not resolve host base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

bitflags! {
    /// Feature toggles controlling which timer categories are tracked.
    ///
    /// A category manager is active iff the current flags contain its
    /// entire required subset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConfigFlags: u32 {
        /// Master switch for the whole tracker
        const ENABLED = 0x01;
        /// Track submersible voyages
        const SUBMERSIBLES = 0x02;
        /// Track airship voyages
        const AIRSHIPS = 0x04;
        /// Timer window is shown
        const WINDOW_VISIBLE = 0x08;
    }
}

impl ConfigFlags {
    /// True iff all of `required` are set.
    pub fn check(self, required: ConfigFlags) -> bool {
        self.contains(required)
    }
}

/// Tracker configuration.
///
/// Loaded from `purser.toml` next to the host binary, created with defaults
/// on first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurserConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Feature flag bitset
    pub flags: ConfigFlags,
}

impl Default for PurserConfig {
    fn default() -> Self {
        Self {
            version: 1,
            flags: ConfigFlags::ENABLED | ConfigFlags::SUBMERSIBLES | ConfigFlags::AIRSHIPS,
        }
    }
}

impl PurserConfig {
    /// Load config from file, creating default if missing.
    pub fn load() -> ConfigResult<Self> {
        let path = config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save()?;
            tracing::info!("Created default config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    pub fn reload(&mut self) -> ConfigResult<()> {
        let path = config_path()?;
        let content = std::fs::read_to_string(&path)?;
        *self = toml::from_str(&content)?;
        tracing::debug!("Reloaded config from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_toml() {
        let config = PurserConfig {
            version: 2,
            flags: ConfigFlags::ENABLED | ConfigFlags::AIRSHIPS,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: PurserConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.version, 2);
        assert_eq!(parsed.flags, config.flags);
    }

    #[test]
    fn default_tracks_both_machine_types() {
        let config = PurserConfig::default();
        assert!(config.flags.check(ConfigFlags::ENABLED | ConfigFlags::SUBMERSIBLES));
        assert!(config.flags.check(ConfigFlags::ENABLED | ConfigFlags::AIRSHIPS));
        assert!(!config.flags.contains(ConfigFlags::WINDOW_VISIBLE));
    }

    #[test]
    fn check_requires_full_subset() {
        let flags = ConfigFlags::ENABLED;
        assert!(flags.check(ConfigFlags::ENABLED));
        assert!(!flags.check(ConfigFlags::ENABLED | ConfigFlags::SUBMERSIBLES));
        assert!(ConfigFlags::empty().check(ConfigFlags::empty()));
    }
}
