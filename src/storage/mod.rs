//! Key-value persistence for step totals and power records
//!
//! Everything stepdex persists goes through [`KeyValueStore`], a small
//! string-to-string interface mirroring what a mobile host's async storage
//! offers. Two implementations ship with the crate:
//!
//! - [`SqliteStore`]: durable store in `~/.stepdex/stepdex.db`
//! - [`MemoryStore`]: process-local map, used by tests and dry runs
//!
//! # Key layout
//!
//! ```text
//! total_steps            -> "1234"
//! pokemon_power_25       -> {"pokemonId":25,"powerLevel":12,...}
//! ```

mod memory;
mod migrate;
mod sqlite;

pub use memory::MemoryStore;
pub use migrate::migrate_legacy_totals;
pub use sqlite::SqliteStore;

use std::sync::Arc;

/// Persisted key names
pub struct StorageKeys;

impl StorageKeys {
    /// Canonical key for the lifetime step total
    pub const TOTAL_STEPS: &'static str = "total_steps";

    /// Prefix for per-entity power records, followed by the entity id
    pub const POWER_PREFIX: &'static str = "pokemon_power_";

    /// Older step-total keys that are folded into [`Self::TOTAL_STEPS`] on load
    pub const LEGACY_TOTAL_STEPS: &'static [&'static str] =
        &["pokemon_app_total_steps", "totalSteps"];

    /// Key of the power record for an entity
    pub fn power(entity_id: u32) -> String {
        format!("{}{}", Self::POWER_PREFIX, entity_id)
    }
}

/// Errors raised by a [`KeyValueStore`]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("Corrupt value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// String key-value persistence
///
/// Methods take `&self`; implementations synchronize internally so a single
/// store can be shared between the step estimator and the power ledger.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, in no particular order
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Delete every key
    fn clear(&self) -> Result<(), StorageError>;
}

/// Store handle shared between components
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and parse the persisted step total under `key`.
///
/// Read failures and unparsable values are logged and reported as `None`,
/// so callers fall back to their default.
pub fn read_total(store: &dyn KeyValueStore, key: &str) -> Option<u64> {
    match store.get(key) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(total) => Some(total),
            Err(e) => {
                tracing::warn!("Ignoring unparsable step total under '{}': {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Failed to read step total: {}", e);
            None
        }
    }
}
