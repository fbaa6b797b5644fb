//! Step command implementation

use anyhow::Result;
use std::path::Path;

use stepdex::pedometer::StepEstimator;
use stepdex::power::{PowerLedger, PowerSession};

use super::{open, print_level_ups};

/// Add a step delta and power up the listed creatures
pub fn step_command(config_path: Option<&Path>, count: u32, entities: &[u32]) -> Result<()> {
    let (config, store) = open(config_path)?;
    let mut estimator = StepEstimator::load(store.clone(), &config.pedometer);

    let mut session = PowerSession::new(
        PowerLedger::new(store),
        config.mapper(),
        config.settings.level_up_display(),
        estimator.total(),
    );
    for id in entities {
        session.track(*id);
    }

    let total = estimator.apply_delta(count);
    let events = session.on_steps(total);
    let snapshot = session.snapshot();

    println!(
        "+{} steps -> {} total, LVL {} ({} to next)",
        count, snapshot.steps, snapshot.power_level, snapshot.steps_to_next
    );
    print_level_ups(&events, session.level_up_display());

    Ok(())
}
