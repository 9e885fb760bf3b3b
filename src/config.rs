//! On-disk configuration for the PoW-hash cache and consensus network
//! selection, loaded/saved as TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::params::{KernelLogging, Network};
use crate::powcache::{PowCacheConfig, DEFAULT_MAX_ELEMENTS, DEFAULT_SAVE_INTERVAL, DEFAULT_VALIDATE};

/// Main configuration for the kernel engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub network: NetworkSelection,

    #[serde(default)]
    pub pow_cache: PowCacheSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSelection {
    #[serde(default = "default_network")]
    pub network: Network,
}

fn default_network() -> Network {
    Network::Mainnet
}

impl Default for NetworkSelection {
    fn default() -> Self {
        Self {
            network: default_network(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowCacheSettings {
    #[serde(default = "default_max_elements")]
    pub powcachemaxelements: i64,

    #[serde(default = "default_validate")]
    pub powcachevalidate: bool,

    #[serde(default = "default_save_interval")]
    pub powcachesaveinterval: i64,
}

fn default_max_elements() -> i64 {
    DEFAULT_MAX_ELEMENTS
}

fn default_validate() -> bool {
    DEFAULT_VALIDATE
}

fn default_save_interval() -> i64 {
    DEFAULT_SAVE_INTERVAL
}

impl Default for PowCacheSettings {
    fn default() -> Self {
        Self {
            powcachemaxelements: default_max_elements(),
            powcachevalidate: default_validate(),
            powcachesaveinterval: default_save_interval(),
        }
    }
}

impl PowCacheSettings {
    pub fn to_cache_config(&self) -> PowCacheConfig {
        PowCacheConfig {
            max_elements: self.powcachemaxelements,
            validate: self.powcachevalidate,
            save_interval: self.powcachesaveinterval,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub print_stake_modifier: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug: false,
            print_stake_modifier: false,
        }
    }
}

impl LoggingSettings {
    pub fn to_kernel_logging(&self) -> KernelLogging {
        KernelLogging {
            debug: self.debug,
            print_stake_modifier: self.print_stake_modifier,
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            network: NetworkSelection::default(),
            pow_cache: PowCacheSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl KernelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms)
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}

/// Default data directory: `~/.pos-kernel`.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".pos-kernel")
}

pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = KernelConfig::default();
        config.network.network = Network::Testnet;
        config.pow_cache.powcachemaxelements = 42;
        config.save(&path).unwrap();

        let loaded = KernelConfig::load(&path).unwrap();
        assert_eq!(loaded.network.network, Network::Testnet);
        assert_eq!(loaded.pow_cache.powcachemaxelements, 42);
    }

    #[test]
    fn logging_settings_convert_to_kernel_logging() {
        let settings = LoggingSettings {
            debug: true,
            print_stake_modifier: true,
        };
        let kernel_logging = settings.to_kernel_logging();
        assert!(kernel_logging.debug);
        assert!(kernel_logging.print_stake_modifier);
    }

    #[test]
    fn defaults_match_powcache_module_constants() {
        let config = KernelConfig::default();
        assert_eq!(config.pow_cache.powcachemaxelements, DEFAULT_MAX_ELEMENTS);
        assert_eq!(config.pow_cache.powcachevalidate, DEFAULT_VALIDATE);
        assert_eq!(config.pow_cache.powcachesaveinterval, DEFAULT_SAVE_INTERVAL);
    }

    #[test]
    fn missing_file_reports_context() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(KernelConfig::load(&path).is_err());
    }
}
