//! Encore configuration file handling

use anyhow::{Context, Result};
use encore_core::EncoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up in the config directory.
pub const CONFIG_FILE: &str = "encore.toml";

/// Top-level configuration file (encore.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EncoreConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Options for `encore replay`
#[derive(Debug, Deserialize, Serialize)]
pub struct ReplayConfig {
    /// Buttons whose new presses are logged during replay
    #[serde(default = "default_watch")]
    pub watch: Vec<String>,
}

fn default_watch() -> Vec<String> {
    ["A", "B", "X", "Y", "L1", "L2", "R1", "R2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            watch: default_watch(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a directory (looks for encore.toml).
    ///
    /// A missing file is not an error; the defaults match the robot-side
    /// layout (`/usd/<name>.vrf`, 5ms ticks).
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = if path.is_file() {
            path.to_path_buf()
        } else {
            path.join(CONFIG_FILE)
        };

        if !config_path.exists() {
            tracing::debug!(
                "No {} in {}, using defaults",
                CONFIG_FILE,
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write a default encore.toml into `dir`, refusing to overwrite one.
    pub fn write_default(dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        fs::write(&path, Self::default().to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
