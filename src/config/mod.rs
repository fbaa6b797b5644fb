//! Configuration loading and management

mod io;
mod settings;

pub use settings::{PedometerSettings, Settings, StepStrategy, StorageSettings};

use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::power::PowerMapper;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Step estimator settings
    #[serde(default)]
    pub pedometer: PedometerSettings,

    /// Persistence settings
    #[serde(default)]
    pub storage: StorageSettings,
}

impl Config {
    /// Check constraints the types alone cannot express
    pub fn validate(&self) -> Result<()> {
        let threshold = self.pedometer.peak_threshold;
        if !threshold.is_finite() || threshold < 1.0 {
            bail!(
                "pedometer.peak_threshold must be a finite value >= 1.0 (got {})",
                threshold
            );
        }
        if self.pedometer.sample_interval_ms == 0 {
            bail!("pedometer.sample_interval_ms must be positive");
        }
        Ok(())
    }

    /// Power mapper for the configured steps-per-level
    pub fn mapper(&self) -> PowerMapper {
        PowerMapper::new(self.settings.steps_per_level)
    }

    /// Database path, falling back to the default location
    pub fn store_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(Self::default_store_path)
    }

    /// Default database path (~/.stepdex/stepdex.db)
    pub fn default_store_path() -> PathBuf {
        Self::global_config_dir().join("stepdex.db")
    }
}
