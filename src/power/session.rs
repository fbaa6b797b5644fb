//! Power session - turns step totals into presentation events
//!
//! Holds the entities currently on screen and, for every step total the
//! estimator publishes, reports the global progress followed by any
//! per-entity level-ups.

use std::collections::BTreeMap;
use std::time::Duration;

use super::ledger::{EntityId, EntityTracker, LevelOrigin, LevelUp, PowerLedger};
use super::mapper::{PowerMapper, PowerSnapshot};

/// Events produced for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum PowerEvent {
    /// Global progress, emitted on every update
    Progress(PowerSnapshot),
    /// One-shot level-up of a tracked entity; the celebration dismisses
    /// itself after [`PowerSession::level_up_display`]
    LevelUp(LevelUp),
}

/// Level of an entity as shown when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityPower {
    pub entity_id: EntityId,
    pub level: u64,
    pub origin: LevelOrigin,
}

/// Tracks global progress and the entities being observed
pub struct PowerSession {
    ledger: PowerLedger,
    mapper: PowerMapper,
    display_for: Duration,
    snapshot: PowerSnapshot,
    tracked: BTreeMap<EntityId, EntityTracker>,
}

impl PowerSession {
    /// Create a session starting from a known step total
    pub fn new(
        ledger: PowerLedger,
        mapper: PowerMapper,
        display_for: Duration,
        initial_steps: u64,
    ) -> Self {
        Self {
            snapshot: mapper.snapshot(initial_steps),
            ledger,
            mapper,
            display_for,
            tracked: BTreeMap::new(),
        }
    }

    pub fn ledger(&self) -> &PowerLedger {
        &self.ledger
    }

    /// How long a level-up celebration stays visible
    pub fn level_up_display(&self) -> Duration {
        self.display_for
    }

    /// Latest global progress
    pub fn snapshot(&self) -> PowerSnapshot {
        self.snapshot
    }

    /// Start observing an entity (idempotent).
    ///
    /// The entity's level is loaded from its record, or inherited from the
    /// current global level if it has none. No level-up fires on load.
    pub fn track(&mut self, entity_id: EntityId) -> EntityPower {
        let global_level = self.snapshot.power_level;
        let ledger = &self.ledger;
        let tracker = self
            .tracked
            .entry(entity_id)
            .or_insert_with(|| EntityTracker::load(ledger, entity_id, global_level));

        EntityPower {
            entity_id,
            level: tracker.level(),
            origin: tracker.origin(),
        }
    }

    /// Stop observing an entity
    pub fn untrack(&mut self, entity_id: EntityId) -> bool {
        self.tracked.remove(&entity_id).is_some()
    }

    /// Current level of a tracked entity
    pub fn tracked_level(&self, entity_id: EntityId) -> Option<u64> {
        self.tracked.get(&entity_id).map(|t| t.level())
    }

    /// Ids of the tracked entities, ascending
    pub fn tracked_ids(&self) -> Vec<EntityId> {
        self.tracked.keys().copied().collect()
    }

    /// Apply a new step total.
    ///
    /// Always yields a `Progress` event first, then one `LevelUp` per
    /// tracked entity whose recorded level the global level now exceeds.
    pub fn on_steps(&mut self, total: u64) -> Vec<PowerEvent> {
        self.snapshot = self.mapper.snapshot(total);
        let mut events = vec![PowerEvent::Progress(self.snapshot)];

        let global_level = self.snapshot.power_level;
        for tracker in self.tracked.values_mut() {
            if let Some(level_up) = tracker.observe(&self.ledger, global_level, total) {
                events.push(PowerEvent::LevelUp(level_up));
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn session(initial_steps: u64) -> PowerSession {
        let ledger = PowerLedger::new(Arc::new(MemoryStore::new()));
        PowerSession::new(
            ledger,
            PowerMapper::default(),
            Duration::from_millis(2000),
            initial_steps,
        )
    }

    fn level_ups(events: &[PowerEvent]) -> Vec<&LevelUp> {
        events
            .iter()
            .filter_map(|e| match e {
                PowerEvent::LevelUp(level_up) => Some(level_up),
                PowerEvent::Progress(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_progress_comes_first() {
        let mut session = session(0);
        let events = session.on_steps(250);
        assert_eq!(
            events[0],
            PowerEvent::Progress(PowerMapper::default().snapshot(250))
        );
        assert_eq!(session.snapshot().power_level, 2);
    }

    #[test]
    fn test_new_entity_inherits_then_levels_once() {
        let mut session = session(350);
        let power = session.track(1);
        assert_eq!(power.level, 3);
        assert_eq!(power.origin, LevelOrigin::Inherited);

        assert!(level_ups(&session.on_steps(399)).is_empty());

        let events = session.on_steps(400);
        let ups = level_ups(&events);
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].new_level, 4);
        assert_eq!(session.ledger().read(1).unwrap().power_level, 4);
        assert!(matches!(events[1], PowerEvent::LevelUp(_)));
        assert_eq!(session.level_up_display(), Duration::from_millis(2000));
    }

    #[test]
    fn test_level_up_per_tracked_entity() {
        let mut session = session(0);
        session.track(1);
        session.track(2);
        session.track(1);
        assert_eq!(session.tracked_ids(), vec![1, 2]);

        let ups = session.on_steps(100);
        assert_eq!(level_ups(&ups).len(), 2);

        assert!(session.untrack(2));
        assert_eq!(level_ups(&session.on_steps(200)).len(), 1);
        assert_eq!(session.tracked_level(1), Some(2));
        assert_eq!(session.tracked_level(2), None);
    }

    #[test]
    fn test_jump_of_several_levels_fires_once() {
        let mut session = session(0);
        session.track(10);

        let events = session.on_steps(530);
        let ups = level_ups(&events);
        assert_eq!(ups.len(), 1);
        assert_eq!((ups[0].old_level, ups[0].new_level), (0, 5));
    }
}
