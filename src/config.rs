//! Service configuration for the panorama pipeline.
//!
//! Configuration is read from `~/.panovr/panovr.toml`. Every field has a
//! default so a missing or partial file still yields a usable config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::{plog_debug, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for uploaded images and generated results.
    /// Defaults to `~/.panovr/uploads` when unset.
    pub storage_root: Option<String>,
    /// Public URL prefix that maps onto `storage_root`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Maximum number of pipeline tasks running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,
    /// How long terminated tasks stay queryable before the janitor evicts them.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    /// How often the janitor sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_base_url() -> String {
    "/files".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_retention_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: None,
            base_url: default_base_url(),
            max_concurrent_tasks: default_max_concurrent(),
            retention_hours: default_retention_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Config {
    pub fn panovr_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".panovr"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::panovr_dir()?.join("panovr.toml"))
    }

    /// Resolve the upload root: configured `storage_root` (with `~`
    /// expansion) or `~/.panovr/uploads`.
    pub fn upload_dir(&self) -> Result<PathBuf> {
        match &self.storage_root {
            Some(dir) => Ok(expand_tilde(dir)),
            None => Ok(Self::panovr_dir()?.join("uploads")),
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        plog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            plog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        plog_debug!(
            "Config loaded: storage_root={:?}, base_url={}, max_concurrent_tasks={}",
            config.storage_root,
            config.base_url,
            config.max_concurrent_tasks
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let panovr_dir = Self::panovr_dir()?;
        if !panovr_dir.exists() {
            fs::create_dir_all(&panovr_dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        plog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        let panovr_dir = Self::panovr_dir()?;
        let upload_dir = self.upload_dir()?;
        if !panovr_dir.exists() {
            fs::create_dir_all(&panovr_dir)?;
        }
        if !upload_dir.exists() {
            fs::create_dir_all(&upload_dir)?;
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
