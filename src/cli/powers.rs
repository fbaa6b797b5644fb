//! Powers command implementation

use anyhow::Result;
use std::path::Path;

use stepdex::pedometer::StepEstimator;
use stepdex::power::PowerLedger;

use super::open;

/// List creature power levels
pub fn powers_command(config_path: Option<&Path>, entities: &[u32]) -> Result<()> {
    let (config, store) = open(config_path)?;
    let global_level = config
        .mapper()
        .level(StepEstimator::load(store.clone(), &config.pedometer).total());
    let ledger = PowerLedger::new(store);

    if !entities.is_empty() {
        for (id, level) in ledger.levels_for(entities, global_level) {
            println!("  #{:03}  LVL {}", id, level);
        }
        return Ok(());
    }

    let records = ledger.read_all();
    if records.is_empty() {
        println!("No creature has powered up yet (global level {}).", global_level);
        return Ok(());
    }

    println!("Creatures ({}):\n", records.len());
    for record in records.values() {
        println!(
            "  #{:03}  LVL {:<4} at {} steps  ({})",
            record.entity_id,
            record.power_level,
            record.steps,
            record.last_updated.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
