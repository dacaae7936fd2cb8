use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory by [`AppConfig::load_or_default`].
pub const CONFIG_FILE: &str = "traffic-workbench.json";

/// Application configuration. Every field has a default, so a config file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ground-truth column of labeled traffic files.
    pub target_column: String,
    pub risk: RiskThresholds,
    pub table: TableWindowConfig,
    pub window: WindowConfig,
}

/// Probability bands for risk tiers: `p > high` is high risk,
/// `warning < p <= high` is a warning, anything else is safe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub warning: f64,
}

/// Row window of the large-table grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableWindowConfig {
    pub initial_rows: usize,
    pub step: usize,
    /// Extend when the last rendered row is this close to the window end.
    pub margin: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_column: "label".to_string(),
            risk: RiskThresholds::default(),
            table: TableWindowConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            warning: 0.5,
        }
    }
}

impl Default for TableWindowConfig {
    fn default() -> Self {
        Self {
            initial_rows: 200,
            step: 200,
            margin: 20,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 820.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `traffic-workbench.json` from the working directory, or defaults.
    pub fn load_or_default() -> Result<Self> {
        let path = PathBuf::from(CONFIG_FILE);
        if path.exists() {
            log::info!("loading configuration from {}", path.display());
            return Self::load(&path);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        let RiskThresholds { high, warning } = self.risk;
        ensure!(
            (0.0..=1.0).contains(&warning) && (0.0..=1.0).contains(&high) && warning <= high,
            "risk thresholds must satisfy 0 <= warning <= high <= 1 (got warning={warning}, high={high})"
        );
        ensure!(
            !self.target_column.trim().is_empty(),
            "target_column must not be empty"
        );
        ensure!(
            self.table.initial_rows > 0 && self.table.step > 0,
            "table.initial_rows and table.step must be positive"
        );
        Ok(())
    }
}
