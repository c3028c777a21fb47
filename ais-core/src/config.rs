//! Configuration file management for ais-decode.
//!
//! Reads/writes `~/.ais-decode/config.yaml` with tracker TTL, layout table
//! location, and the default AIS source address.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout::FieldLayoutTable;
use crate::tracker::DEFAULT_TTL;
use crate::types::{AisError, Result};

/// Full configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub layout: LayoutConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// JSON layout table. `None` uses the bundled table.
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            ttl_seconds: DEFAULT_TTL,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            host: "10.0.1.4".into(),
            port: 8101,
        }
    }
}

impl SourceConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load the configured layout table, or the bundled one.
    ///
    /// A broken table is a startup error; callers should not continue without it.
    pub fn load_layout(&self) -> Result<FieldLayoutTable> {
        match &self.layout.path {
            Some(path) => FieldLayoutTable::load(path),
            None => Ok(FieldLayoutTable::builtin()),
        }
    }
}

/// Get the config directory path (`~/.ais-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".ais-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.ais-decode/config.yaml`.
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Config::default()
        }
    }
}

/// Load config from an explicit path. Errors are reported, not defaulted.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AisError::Config(format!("{}: {e}", path.display())))?;
    parse_config(&text)
}

/// Save config to `~/.ais-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| AisError::Config(e.to_string()))?;

    let path = config_file();
    std::fs::write(&path, serialize_config(config)?).map_err(|e| AisError::Config(e.to_string()))?;

    Ok(path)
}

fn parse_config(text: &str) -> Result<Config> {
    if text.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(text).map_err(|e| AisError::Config(e.to_string()))
}

fn serialize_config(config: &Config) -> Result<String> {
    let body = serde_yaml::to_string(config).map_err(|e| AisError::Config(e.to_string()))?;
    Ok(format!("# ais-decode configuration\n\n{body}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
