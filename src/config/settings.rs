//! Settings configuration types

use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Steps needed to gain one power level. Must be positive.
    #[serde(default = "default_steps_per_level")]
    pub steps_per_level: NonZeroU64,

    /// How long a level-up celebration stays on screen before dismissing itself
    #[serde(default = "default_level_up_display_ms")]
    pub level_up_display_ms: u64,
}

impl Settings {
    pub fn level_up_display(&self) -> Duration {
        Duration::from_millis(self.level_up_display_ms)
    }
}

fn default_steps_per_level() -> NonZeroU64 {
    NonZeroU64::new(100).expect("non-zero literal")
}

fn default_level_up_display_ms() -> u64 {
    2000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            steps_per_level: default_steps_per_level(),
            level_up_display_ms: default_level_up_display_ms(),
        }
    }
}

/// Where step events come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStrategy {
    /// Platform step counter reporting step deltas
    #[default]
    Native,
    /// Peak detection over raw accelerometer samples
    Peak,
}

impl std::fmt::Display for StepStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Peak => write!(f, "peak"),
        }
    }
}

/// Step estimator tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedometerSettings {
    #[serde(default)]
    pub strategy: StepStrategy,

    /// Accelerometer sampling interval. Replayed samples without a timestamp
    /// are spaced by this much.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Number of magnitudes in the sliding mean window
    #[serde(default = "default_window_size")]
    pub window_size: NonZeroUsize,

    /// A peak must exceed the window mean by `peak_threshold - 1` (in g)
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f64,

    /// Minimum time between two detected steps
    #[serde(default = "default_refractory_ms")]
    pub refractory_ms: u64,
}

fn default_sample_interval_ms() -> u64 {
    100
}

fn default_window_size() -> NonZeroUsize {
    NonZeroUsize::new(10).expect("non-zero literal")
}

fn default_peak_threshold() -> f64 {
    1.15
}

fn default_refractory_ms() -> u64 {
    300
}

impl Default for PedometerSettings {
    fn default() -> Self {
        Self {
            strategy: StepStrategy::default(),
            sample_interval_ms: default_sample_interval_ms(),
            window_size: default_window_size(),
            peak_threshold: default_peak_threshold(),
            refractory_ms: default_refractory_ms(),
        }
    }
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// Database path. Defaults to ~/.stepdex/stepdex.db
    #[serde(default)]
    pub path: Option<PathBuf>,
}
