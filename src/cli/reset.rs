//! Reset command implementation

use anyhow::Result;
use std::path::Path;
use tracing::info;

use stepdex::power::PowerLedger;
use stepdex::storage::KeyValueStore;

use super::open;

/// Delete power records, and optionally the step total as well
pub fn reset_command(config_path: Option<&Path>, steps: bool) -> Result<()> {
    let (_, store) = open(config_path)?;

    if steps {
        store.clear()?;
        info!("Cleared all stepdex data");
        println!("All data cleared.");
        return Ok(());
    }

    let removed = PowerLedger::new(store).clear();
    println!("Removed {} power record(s).", removed);
    Ok(())
}
