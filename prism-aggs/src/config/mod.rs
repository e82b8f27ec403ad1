//! Configuration management for prism-aggs
//!
//! Default config location: ~/.prism/aggs.toml

use crate::context::DEFAULT_MAX_BUCKETS;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reduce: ReduceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReduceConfig {
    /// Maximum number of buckets a single reduction may hold at once
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,
    /// How many partial results are reduced together at each tree level
    #[serde(default = "default_batched_reduce_size")]
    pub batched_reduce_size: usize,
}

fn default_max_buckets() -> usize {
    DEFAULT_MAX_BUCKETS
}

fn default_batched_reduce_size() -> usize {
    512
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            max_buckets: default_max_buckets(),
            batched_reduce_size: default_batched_reduce_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    pub file: Option<PathBuf>,
    /// Log output format: "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
            format: default_log_format(),
        }
    }
}

/// ~/.prism/aggs.toml, or a relative path when no home directory exists
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".prism"))
        .unwrap_or_else(|| PathBuf::from(".prism"))
        .join("aggs.toml")
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    /// Load config from a file that must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let path = expand_tilde(path)?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file path, falling back to defaults when it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if expand_tilde(path)?.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.reduce.max_buckets == 0 {
            bail!("reduce.max_buckets must be greater than 0");
        }
        if self.reduce.batched_reduce_size < 2 {
            bail!(
                "reduce.batched_reduce_size must be at least 2, got {}",
                self.reduce.batched_reduce_size
            );
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => bail!("logging.format must be \"pretty\" or \"json\", got {:?}", other),
        }
    }

    /// Expand ~ in all paths
    fn expand_paths(&mut self) -> Result<()> {
        if let Some(ref f) = self.logging.file {
            self.logging.file = Some(expand_tilde(f)?);
        }
        Ok(())
    }
}
