//! Per-entity power records and level-up detection
//!
//! Every catalog entity remembers the power level it last reached. Records
//! are JSON documents under `pokemon_power_<id>` and are only rewritten when
//! the entity actually levels up.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{SharedStore, StorageError, StorageKeys};

/// Catalog entity identifier
pub type EntityId = u32;

/// Last power level applied to an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerRecord {
    #[serde(rename = "pokemonId")]
    pub entity_id: EntityId,
    pub power_level: u64,
    /// Step total at the moment the level was recorded
    pub steps: u64,
    pub last_updated: DateTime<Utc>,
}

/// An entity reached a higher power level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub entity_id: EntityId,
    pub old_level: u64,
    pub new_level: u64,
}

/// Reads and writes power records
#[derive(Clone)]
pub struct PowerLedger {
    store: SharedStore,
}

impl PowerLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stored record for an entity.
    ///
    /// Unreadable or corrupt records are logged and treated as absent.
    pub fn read(&self, entity_id: EntityId) -> Option<PowerRecord> {
        let key = StorageKeys::power(entity_id);
        match self.store.get(&key) {
            Ok(Some(raw)) => match parse_record(&key, &raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Error getting power record: {}", e);
                None
            }
        }
    }

    /// Overwrite the record for an entity.
    ///
    /// Persistence failures are logged; the record is returned either way so
    /// in-memory state keeps moving.
    pub fn write(&self, entity_id: EntityId, power_level: u64, steps: u64) -> PowerRecord {
        let record = PowerRecord {
            entity_id,
            power_level,
            steps,
            last_updated: Utc::now(),
        };

        let key = StorageKeys::power(entity_id);
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = self.store.set(&key, &json) {
                    tracing::warn!("Error saving power record: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize power record for {}: {}", key, e),
        }
        record
    }

    /// Every stored record, keyed by entity id.
    ///
    /// Corrupt entries are skipped. A failure to list keys yields an empty map.
    pub fn read_all(&self) -> BTreeMap<EntityId, PowerRecord> {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Error listing power records: {}", e);
                return BTreeMap::new();
            }
        };

        let mut records = BTreeMap::new();
        for key in keys
            .iter()
            .filter(|k| k.starts_with(StorageKeys::POWER_PREFIX))
        {
            let raw = match self.store.get(key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Error getting power record: {}", e);
                    continue;
                }
            };
            match parse_record(key, &raw) {
                Ok(record) => {
                    records.insert(record.entity_id, record);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }
        records
    }

    /// Level to show for each listed entity: its recorded level, or the
    /// global level for entities that never levelled up.
    pub fn levels_for(
        &self,
        entity_ids: &[EntityId],
        global_level: u64,
    ) -> BTreeMap<EntityId, u64> {
        let records = self.read_all();
        entity_ids
            .iter()
            .map(|id| {
                let level = records
                    .get(id)
                    .map(|r| r.power_level)
                    .unwrap_or(global_level);
                (*id, level)
            })
            .collect()
    }

    /// Delete every power record, returning how many were removed
    pub fn clear(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Error listing power records: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys
            .iter()
            .filter(|k| k.starts_with(StorageKeys::POWER_PREFIX))
        {
            match self.store.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Error removing power record: {}", e),
            }
        }
        removed
    }
}

fn parse_record(key: &str, raw: &str) -> Result<PowerRecord, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Where an entity's starting level came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOrigin {
    /// Loaded from the entity's power record
    Stored,
    /// No record yet; the entity starts at the global level
    Inherited,
}

/// Level state of one entity while it is being observed
#[derive(Debug, Clone)]
pub struct EntityTracker {
    entity_id: EntityId,
    recorded_level: u64,
    origin: LevelOrigin,
}

impl EntityTracker {
    /// Start tracking an entity.
    ///
    /// An entity without a record inherits `global_level` rather than
    /// starting at zero, so opening it never fires a level-up for progress
    /// made before it was first seen. The inherited level is not persisted;
    /// the first record is written on the first real level-up.
    pub fn load(ledger: &PowerLedger, entity_id: EntityId, global_level: u64) -> Self {
        match ledger.read(entity_id) {
            Some(record) => Self {
                entity_id,
                recorded_level: record.power_level,
                origin: LevelOrigin::Stored,
            },
            None => Self {
                entity_id,
                recorded_level: global_level,
                origin: LevelOrigin::Inherited,
            },
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn level(&self) -> u64 {
        self.recorded_level
    }

    pub fn origin(&self) -> LevelOrigin {
        self.origin
    }

    /// React to a new global level.
    ///
    /// Returns a level-up exactly when `global_level` exceeds the recorded
    /// level; the record is written and the recorded level advanced first.
    pub fn observe(
        &mut self,
        ledger: &PowerLedger,
        global_level: u64,
        steps: u64,
    ) -> Option<LevelUp> {
        if global_level <= self.recorded_level {
            return None;
        }

        let old_level = self.recorded_level;
        ledger.write(self.entity_id, global_level, steps);
        self.recorded_level = global_level;
        self.origin = LevelOrigin::Stored;

        tracing::info!(
            "Entity #{} powered up: {} -> {}",
            self.entity_id,
            old_level,
            global_level
        );
        Some(LevelUp {
            entity_id: self.entity_id,
            old_level,
            new_level: global_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn ledger() -> (Arc<MemoryStore>, PowerLedger) {
        let store = Arc::new(MemoryStore::new());
        let ledger = PowerLedger::new(store.clone());
        (store, ledger)
    }

    #[test]
    fn test_write_then_read() {
        let (_, ledger) = ledger();
        assert!(ledger.read(25).is_none());

        ledger.write(25, 3, 340);
        let record = ledger.read(25).unwrap();
        assert_eq!(record.entity_id, 25);
        assert_eq!(record.power_level, 3);
        assert_eq!(record.steps, 340);
    }

    #[test]
    fn test_write_overwrites() {
        let (_, ledger) = ledger();
        ledger.write(7, 1, 100);
        ledger.write(7, 4, 420);
        assert_eq!(ledger.read(7).unwrap().power_level, 4);
        assert_eq!(ledger.read_all().len(), 1);
    }

    #[test]
    fn test_reads_records_written_by_the_mobile_app() {
        let (store, ledger) = ledger();
        store
            .set(
                "pokemon_power_4",
                r#"{"pokemonId":4,"powerLevel":6,"steps":612,"lastUpdated":"2024-05-01T09:30:00.000Z"}"#,
            )
            .unwrap();

        let record = ledger.read(4).unwrap();
        assert_eq!(record.power_level, 6);
        assert_eq!(record.steps, 612);
    }

    #[test]
    fn test_read_all_skips_corrupt_and_foreign_keys() {
        let (store, ledger) = ledger();
        ledger.write(1, 2, 200);
        ledger.write(150, 5, 530);
        store.set("pokemon_power_9", "{broken").unwrap();
        store.set(StorageKeys::TOTAL_STEPS, "530").unwrap();

        let all = ledger.read_all();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![1, 150]);
        assert!(ledger.read(9).is_none());
    }

    #[test]
    fn test_levels_for_falls_back_to_global() {
        let (_, ledger) = ledger();
        ledger.write(1, 2, 200);

        let levels = ledger.levels_for(&[1, 2, 3], 5);
        assert_eq!(levels[&1], 2);
        assert_eq!(levels[&2], 5);
        assert_eq!(levels[&3], 5);
    }

    #[test]
    fn test_clear_keeps_step_total() {
        let (store, ledger) = ledger();
        ledger.write(1, 2, 200);
        ledger.write(2, 2, 200);
        store.set(StorageKeys::TOTAL_STEPS, "200").unwrap();

        assert_eq!(ledger.clear(), 2);
        assert!(ledger.read_all().is_empty());
        assert_eq!(store.get(StorageKeys::TOTAL_STEPS).unwrap().as_deref(), Some("200"));
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let (store, ledger) = ledger();
        store.fail_writes(true);

        let record = ledger.write(3, 8, 800);
        assert_eq!(record.power_level, 8);

        store.fail_writes(false);
        assert!(ledger.read(3).is_none());
    }

    #[test]
    fn test_tracker_inherits_global_level() {
        let (_, ledger) = ledger();
        let mut tracker = EntityTracker::load(&ledger, 42, 3);
        assert_eq!(tracker.level(), 3);
        assert_eq!(tracker.origin(), LevelOrigin::Inherited);
        assert!(ledger.read(42).is_none());

        assert!(tracker.observe(&ledger, 3, 399).is_none());

        let up = tracker.observe(&ledger, 4, 400).unwrap();
        assert_eq!(up, LevelUp { entity_id: 42, old_level: 3, new_level: 4 });
        assert_eq!(ledger.read(42).unwrap().power_level, 4);
        assert_eq!(tracker.origin(), LevelOrigin::Stored);
    }

    #[test]
    fn test_tracker_prefers_stored_level() {
        let (_, ledger) = ledger();
        ledger.write(9, 7, 700);

        let mut tracker = EntityTracker::load(&ledger, 9, 2);
        assert_eq!(tracker.level(), 7);
        assert_eq!(tracker.origin(), LevelOrigin::Stored);

        // Never lowered by a smaller global level
        assert!(tracker.observe(&ledger, 2, 250).is_none());
        assert_eq!(ledger.read(9).unwrap().power_level, 7);
    }

    #[test]
    fn test_tracker_fires_even_when_persistence_fails() {
        let (store, ledger) = ledger();
        let mut tracker = EntityTracker::load(&ledger, 5, 0);
        store.fail_writes(true);

        assert!(tracker.observe(&ledger, 1, 100).is_some());
        assert_eq!(tracker.level(), 1);
        assert!(tracker.observe(&ledger, 1, 120).is_none());
    }
}
