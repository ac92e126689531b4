use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::utils;

pub const DEFAULT_FEATURED_LIMIT: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: Option<PathBuf>,
    pub featured_limit: usize,
    pub seed_sample_events: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            featured_limit: DEFAULT_FEATURED_LIMIT,
            seed_sample_events: true,
        }
    }
}

impl AppConfig {
    /// Explicit path from the config file, else `DEV_EVENT_HUB_DB`, else the
    /// data root.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(utils::database_path)
    }

    fn apply_env(mut self) -> Self {
        if let Ok(path) = std::env::var(utils::DB_PATH_ENV) {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path.trim()));
            }
        }
        if let Some(limit) = std::env::var(utils::FEATURED_LIMIT_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
        {
            self.featured_limit = limit;
        }
        self
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> Self {
        Self::load_from(utils::config_path())
    }

    /// A missing or unreadable file falls back to defaults; environment
    /// overrides are applied on top either way.
    pub fn load_from(path: PathBuf) -> Self {
        let data = match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("using default config: {err:#}");
                AppConfig::default()
            }
        };
        Self {
            path,
            data: Mutex::new(data.apply_env()),
        }
    }

    pub fn read(&self) -> AppConfig {
        match self.data.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| anyhow!("config mutex poisoned"))?;
        transform(&mut guard);
        write_config(&self.path, &guard)?;
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

fn write_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).with_context(|| format!("failed to write config {}", path.display()))
}
