//! Folding of legacy step-total keys into the canonical key
//!
//! Earlier builds persisted the total under different keys. On load the
//! largest total found anywhere wins, is written to
//! [`StorageKeys::TOTAL_STEPS`], and the legacy keys are removed.

use super::{KeyValueStore, StorageKeys, read_total};

/// Merge legacy totals into the canonical key.
///
/// Returns the resulting canonical total (if any total exists at all).
/// Failures are logged; legacy keys are only removed after the canonical
/// value has been written.
pub fn migrate_legacy_totals(store: &dyn KeyValueStore) -> Option<u64> {
    let canonical = read_total(store, StorageKeys::TOTAL_STEPS);

    let legacy: Vec<(&str, u64)> = StorageKeys::LEGACY_TOTAL_STEPS
        .iter()
        .filter_map(|key| read_total(store, key).map(|total| (*key, total)))
        .collect();

    if legacy.is_empty() {
        return canonical;
    }

    let merged = legacy
        .iter()
        .map(|(_, total)| *total)
        .chain(canonical)
        .max()
        .unwrap_or(0);

    if canonical != Some(merged) {
        if let Err(e) = store.set(StorageKeys::TOTAL_STEPS, &merged.to_string()) {
            tracing::warn!("Failed to migrate legacy step total: {}", e);
            return canonical.max(Some(merged));
        }
    }

    for (key, _) in &legacy {
        if let Err(e) = store.remove(key) {
            tracing::warn!("Failed to remove legacy key '{}': {}", key, e);
        }
    }

    tracing::info!(
        "Migrated {} legacy step total key(s) into '{}' (total {})",
        legacy.len(),
        StorageKeys::TOTAL_STEPS,
        merged
    );
    Some(merged)
}
