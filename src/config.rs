//! Service configuration.
//!
//! Values come from `<config_dir>/cartoquartier/config.json` when present and
//! are then overridden by environment variables:
//! - `CARTOQUARTIER_DATA` - static GeoJSON document loaded when the cache is empty
//! - `CARTOQUARTIER_DB` - path of the cache database
//! - `CARTOQUARTIER_REMOTE_URL` - endpoint receiving saved edits (optional)
//! - `CARTOQUARTIER_CACHE_KEY` - key of the cached collection
//! - `CARTOQUARTIER_ANIMATION_MS` - phase animation interval in milliseconds
//! - `CARTOQUARTIER_CORS_ORIGINS` - allowed CORS origins, comma-separated

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::animator::DEFAULT_INTERVAL;

const APP_NAME: &str = "cartoquartier";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_CACHE_KEY: &str = "cartoquartier:features";
pub const DEFAULT_DATA_PATH: &str = "data/sectors.geojson";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Static GeoJSON document used when nothing is cached yet.
    pub data_path: Option<PathBuf>,
    /// Cache database; the platform data directory when unset.
    pub db_path: Option<PathBuf>,
    /// Remote endpoint for saved edits. Edits stay local when unset.
    pub remote_url: Option<String>,
    pub cache_key: String,
    pub animation_ms: u64,
    /// Allowed CORS origins. Any origin is allowed when unset.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: Some(PathBuf::from(DEFAULT_DATA_PATH)),
            db_path: None,
            remote_url: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            animation_ms: DEFAULT_INTERVAL.as_millis() as u64,
            cors_origins: None,
        }
    }
}

impl Config {
    /// Load the config file, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("CARTOQUARTIER_DATA") {
            self.data_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var("CARTOQUARTIER_DB") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(url) = var("CARTOQUARTIER_REMOTE_URL").filter(|u| !u.trim().is_empty()) {
            self.remote_url = Some(url);
        }
        if let Some(key) = var("CARTOQUARTIER_CACHE_KEY") {
            self.cache_key = key;
        }
        match var("CARTOQUARTIER_ANIMATION_MS").map(|ms| ms.parse::<u64>()) {
            Some(Ok(ms)) if ms > 0 => self.animation_ms = ms,
            Some(_) => tracing::warn!("Ignoring invalid CARTOQUARTIER_ANIMATION_MS"),
            None => {}
        }
        if let Some(origins) = var("CARTOQUARTIER_CORS_ORIGINS") {
            self.cors_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
    }

    pub fn animation_interval(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
