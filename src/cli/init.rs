//! Init command implementation

use anyhow::{Result, bail};
use std::path::Path;
use tracing::info;

use stepdex::config::Config;

/// Default configuration content for stepdex init
pub const DEFAULT_CONFIG: &str = r#"# stepdex configuration
# =====================

# ============================================================================
# SETTINGS
# ============================================================================
#
#   steps_per_level     - Steps needed for one power level (must be > 0, default: 100)
#   level_up_display_ms - How long a level-up celebration stays visible (default: 2000)

[settings]
steps_per_level = 100
level_up_display_ms = 2000

# ============================================================================
# PEDOMETER
# ============================================================================
#
#   strategy           - "native" (platform step counter deltas) or
#                        "peak" (peak detection over accelerometer samples)
#   sample_interval_ms - Accelerometer sampling interval (default: 100)
#   window_size        - Samples in the sliding mean window (default: 10)
#   peak_threshold     - A step must rise (peak_threshold - 1) g above the mean (default: 1.15)
#   refractory_ms      - Minimum time between two steps (default: 300)

[pedometer]
strategy = "native"
sample_interval_ms = 100
window_size = 10
peak_threshold = 1.15
refractory_ms = 300

# ============================================================================
# STORAGE
# ============================================================================
#
#   path - SQLite database file (default: ~/.stepdex/stepdex.db)

[storage]
# path = "/path/to/stepdex.db"
"#;

/// Write the default config to `config_path` or the global location
pub fn init_command(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::write_to_file(&path, DEFAULT_CONFIG)?;

    info!("Created configuration file: {}", path.display());
    println!("Created {}", path.display());

    Ok(())
}
