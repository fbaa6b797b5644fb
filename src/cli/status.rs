//! Status command implementation

use anyhow::Result;
use std::path::Path;

use stepdex::pedometer::StepEstimator;

use super::{open, progress_bar};

/// Show total steps and global power level
pub fn status_command(config_path: Option<&Path>, json: bool) -> Result<()> {
    let (config, store) = open(config_path)?;
    let estimator = StepEstimator::load(store, &config.pedometer);
    let snapshot = config.mapper().snapshot(estimator.total());

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Steps:      {}", snapshot.steps);
    println!("Power:      LVL {}", snapshot.power_level);
    println!(
        "Progress:   {} {} steps to level {}",
        progress_bar(&snapshot, 20),
        snapshot.steps_to_next,
        snapshot.power_level + 1
    );
    println!("Strategy:   {}", config.pedometer.strategy);
    println!("Store:      {}", config.store_path().display());

    Ok(())
}
