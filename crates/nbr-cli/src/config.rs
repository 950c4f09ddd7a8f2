//! Calculator configuration, kept in ~/.nbr5410/config.toml
//!
//! ```toml
//! [sizing]
//! breaker_curve = "B"
//! voltage_drop_limit = 0.03
//!
//! [data]
//! dir = "/opt/nbr5410/tables"
//!
//! [display]
//! decimals = 1
//! ```
//!
//! Every section and field is optional.

use anyhow::{anyhow, Context, Result};
use nbr_core::{ReferenceData, SizingSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    #[serde(default)]
    pub sizing: SizingSettings,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Reference data location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory with the same layout as the built-in tables
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Decimal places in plain output
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

fn default_decimals() -> usize {
    2
}

/// Get the calculator home directory (defaults to ~/.nbr5410)
pub fn calculator_home() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".nbr5410"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(calculator_home()?.join("config.toml"))
}

impl CalculatorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CalculatorConfig = toml::from_str(contents)?;
        config.sizing.validate()?;
        Ok(config)
    }

    /// Load an explicit configuration file, which must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reference tables from `data_dir`, the configured directory, or the built-in set.
    pub fn reference_data(&self, data_dir: Option<&Path>) -> ReferenceData {
        match data_dir.or(self.data.dir.as_deref()) {
            Some(dir) => {
                debug!("Reading reference tables from {}", dir.display());
                ReferenceData::from_directory(dir)
            }
            None => ReferenceData::embedded(),
        }
    }
}
