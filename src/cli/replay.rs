//! Replay command implementation

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use stepdex::pedometer::{ReplaySource, StepEstimator, StepTracker};
use stepdex::power::{PowerLedger, PowerSession};

use super::{open, print_level_ups};

/// Feed a recorded trace through the pedometer, powering up the listed creatures
pub async fn replay_command(
    config_path: Option<&Path>,
    file: &Path,
    entities: &[u32],
    realtime: bool,
) -> Result<()> {
    let (config, store) = open(config_path)?;

    let mut source = ReplaySource::open(file, config.pedometer.sample_interval_ms)?;
    if realtime {
        source = source.with_pacing(Duration::from_millis(config.pedometer.sample_interval_ms));
    }
    println!(
        "Replaying {} readings with the {} strategy",
        source.len(),
        config.pedometer.strategy
    );

    let estimator = StepEstimator::load(store.clone(), &config.pedometer);
    let start = estimator.total();

    let mut session = PowerSession::new(
        PowerLedger::new(store),
        config.mapper(),
        config.settings.level_up_display(),
        start,
    );
    for id in entities {
        let power = session.track(*id);
        println!("  #{:03} starts at level {}", power.entity_id, power.level);
    }

    let mut handle = StepTracker::spawn(estimator, source);
    while let Some(steps) = handle.next_total().await {
        print_level_ups(&session.on_steps(steps), session.level_up_display());
    }

    let total = handle.join().await?;
    let snapshot = session.snapshot();
    println!(
        "Counted {} steps -> {} total, LVL {} ({} to next)",
        total - start,
        total,
        snapshot.power_level,
        snapshot.steps_to_next
    );
    for id in session.tracked_ids() {
        if let Some(level) = session.tracked_level(id) {
            println!("  #{:03} is now level {}", id, level);
        }
    }

    Ok(())
}
