//! CLI command implementations

pub mod init;
pub mod powers;
pub mod replay;
pub mod reset;
pub mod status;
pub mod step;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use stepdex::config::Config;
use stepdex::power::{PowerEvent, PowerSnapshot};
use stepdex::storage::{SharedStore, SqliteStore};

/// Load config and open the store it points at
pub fn open(config_path: Option<&Path>) -> Result<(Config, SharedStore)> {
    let config = Config::load_from(config_path)?;
    let store = SqliteStore::open(&config.store_path())?;
    Ok((config, Arc::new(store)))
}

/// Text progress bar for the current level
pub fn progress_bar(snapshot: &PowerSnapshot, width: usize) -> String {
    let filled = ((snapshot.progress() * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Print level-up events; progress events are summarized by the caller
pub fn print_level_ups(events: &[PowerEvent], display_for: Duration) {
    for event in events {
        if let PowerEvent::LevelUp(level_up) = event {
            println!(
                "  ★ #{:03} powered up! Level {} -> {} ({:.1}s celebration)",
                level_up.entity_id,
                level_up.old_level,
                level_up.new_level,
                display_for.as_secs_f32()
            );
        }
    }
}
