//! Step estimator - the single owner of the lifetime step total
//!
//! The in-memory total is authoritative; the store holds a mirror that is
//! rewritten after every change. A failed write is logged and the total
//! keeps advancing, so a crash loses at most the steps since the last
//! successful write.

use tokio::sync::{mpsc, watch};

use super::peak::{MotionSample, PeakDetector};
use super::sensor::SensorReading;
use crate::config::{PedometerSettings, StepStrategy};
use crate::storage::{SharedStore, StorageKeys, migrate_legacy_totals};

/// Whether the sensing capability is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Not checked yet
    Pending,
    Available,
    /// Missing on this device; the total stays frozen
    Unavailable,
}

/// Published on every change of the total or of availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStatus {
    pub steps: u64,
    pub availability: Availability,
}

/// Counts steps with one strategy and persists the total
pub struct StepEstimator {
    store: SharedStore,
    strategy: StepStrategy,
    detector: PeakDetector,
    total: u64,
    availability: Availability,
    status_tx: watch::Sender<StepStatus>,
    totals_tx: Option<mpsc::UnboundedSender<u64>>,
}

impl StepEstimator {
    /// Restore the persisted total (0 if none) and prepare the strategy.
    ///
    /// Legacy total keys are folded into the canonical key first.
    pub fn load(store: SharedStore, settings: &PedometerSettings) -> Self {
        let total = migrate_legacy_totals(store.as_ref()).unwrap_or(0);
        tracing::debug!(
            "Step estimator loaded total {} ({} strategy)",
            total,
            settings.strategy
        );

        let availability = Availability::Pending;
        let (status_tx, _) = watch::channel(StepStatus {
            steps: total,
            availability,
        });

        Self {
            store,
            strategy: settings.strategy,
            detector: PeakDetector::new(settings),
            total,
            availability,
            status_tx,
            totals_tx: None,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn strategy(&self) -> StepStrategy {
        self.strategy
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn status(&self) -> StepStatus {
        StepStatus {
            steps: self.total,
            availability: self.availability,
        }
    }

    /// Live view of the total; the current value is visible immediately
    pub fn subscribe(&self) -> watch::Receiver<StepStatus> {
        self.status_tx.subscribe()
    }

    /// Every new total, in order. Unlike [`Self::subscribe`] nothing is
    /// coalesced, so a consumer sees each level boundary the total crosses.
    /// Replaces any earlier stream.
    pub fn stream_totals(&mut self) -> mpsc::UnboundedReceiver<u64> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.totals_tx = Some(tx);
        rx
    }

    pub fn mark_available(&mut self) {
        self.set_availability(Availability::Available);
    }

    /// The capability is missing: keep the total where it is
    pub fn mark_unavailable(&mut self) {
        tracing::warn!("Step sensing unavailable, total frozen at {}", self.total);
        self.set_availability(Availability::Unavailable);
    }

    /// Apply a step delta reported by a platform step counter.
    ///
    /// Returns the new total.
    pub fn apply_delta(&mut self, steps: u32) -> u64 {
        if steps > 0 {
            self.advance(u64::from(steps));
        }
        self.total
    }

    /// Feed one accelerometer sample; returns `true` when a step was counted
    pub fn observe(&mut self, sample: &MotionSample) -> bool {
        if !self.detector.observe(sample) {
            return false;
        }
        tracing::debug!(
            "Step detected at {} ms (window mean {:.3} g)",
            sample.timestamp_ms,
            self.detector.mean()
        );
        self.advance(1);
        true
    }

    /// Dispatch a reading to the configured strategy.
    ///
    /// Readings meant for the other strategy are ignored. Returns `true`
    /// when the total changed.
    pub fn handle(&mut self, reading: SensorReading) -> bool {
        match (self.strategy, reading) {
            (StepStrategy::Native, SensorReading::StepDelta(steps)) => {
                let before = self.total;
                self.apply_delta(steps) != before
            }
            (StepStrategy::Peak, SensorReading::Acceleration(sample)) => self.observe(&sample),
            (strategy, reading) => {
                tracing::debug!("Ignoring {:?} under {} strategy", reading, strategy);
                false
            }
        }
    }

    fn advance(&mut self, by: u64) {
        self.total = self.total.saturating_add(by);
        self.persist();
        self.publish();
        let total = self.total;
        let closed = self
            .totals_tx
            .as_ref()
            .is_some_and(|tx| tx.send(total).is_err());
        if closed {
            self.totals_tx = None;
        }
    }

    fn persist(&self) {
        if let Err(e) = self
            .store
            .set(StorageKeys::TOTAL_STEPS, &self.total.to_string())
        {
            tracing::warn!("Error saving total steps: {}", e);
        }
    }

    fn set_availability(&mut self, availability: Availability) {
        if self.availability != availability {
            self.availability = availability;
            self.publish();
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn settings(strategy: StepStrategy) -> PedometerSettings {
        PedometerSettings {
            strategy,
            ..PedometerSettings::default()
        }
    }

    #[test]
    fn test_starts_from_zero() {
        let store = Arc::new(MemoryStore::new());
        let estimator = StepEstimator::load(store, &settings(StepStrategy::Native));
        assert_eq!(estimator.total(), 0);
        assert_eq!(estimator.availability(), Availability::Pending);
    }

    #[test]
    fn test_delta_persists_and_publishes() {
        let store = Arc::new(MemoryStore::new());
        let mut estimator = StepEstimator::load(store.clone(), &settings(StepStrategy::Native));
        let rx = estimator.subscribe();

        assert_eq!(estimator.apply_delta(12), 12);
        assert_eq!(estimator.apply_delta(30), 42);
        assert_eq!(rx.borrow().steps, 42);
        assert_eq!(
            store.get(StorageKeys::TOTAL_STEPS).unwrap().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_zero_delta_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let mut estimator = StepEstimator::load(store.clone(), &settings(StepStrategy::Native));
        let rx = estimator.subscribe();

        estimator.apply_delta(0);
        assert!(!rx.has_changed().unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_restores_persisted_total() {
        let store = Arc::new(MemoryStore::new());
        store.set(StorageKeys::TOTAL_STEPS, "1234").unwrap();

        let estimator = StepEstimator::load(store, &settings(StepStrategy::Native));
        assert_eq!(estimator.total(), 1234);
        assert_eq!(estimator.subscribe().borrow().steps, 1234);
    }

    #[test]
    fn test_read_failure_defaults_to_zero() {
        let store = Arc::new(MemoryStore::new());
        store.set(StorageKeys::TOTAL_STEPS, "80").unwrap();
        store.fail_reads(true);

        let estimator = StepEstimator::load(store, &settings(StepStrategy::Native));
        assert_eq!(estimator.total(), 0);
    }

    #[test]
    fn test_write_failure_keeps_counting() {
        let store = Arc::new(MemoryStore::new());
        store.set(StorageKeys::TOTAL_STEPS, "10").unwrap();
        let mut estimator = StepEstimator::load(store.clone(), &settings(StepStrategy::Native));

        store.fail_writes(true);
        assert_eq!(estimator.apply_delta(5), 15);
        store.fail_writes(false);
        assert_eq!(
            store.get(StorageKeys::TOTAL_STEPS).unwrap().as_deref(),
            Some("10")
        );

        assert_eq!(estimator.apply_delta(1), 16);
        assert_eq!(
            store.get(StorageKeys::TOTAL_STEPS).unwrap().as_deref(),
            Some("16")
        );
    }

    #[test]
    fn test_peak_strategy_counts_samples() {
        let store = Arc::new(MemoryStore::new());
        let mut estimator = StepEstimator::load(store, &settings(StepStrategy::Peak));

        for i in 0..10 {
            assert!(!estimator.handle(SensorReading::Acceleration(MotionSample::new(
                0.0,
                0.0,
                1.0,
                i * 100
            ))));
        }
        assert!(estimator.handle(SensorReading::Acceleration(MotionSample::new(
            0.0, 0.0, 1.6, 1000
        ))));
        assert_eq!(estimator.total(), 1);
    }

    #[test]
    fn test_readings_for_other_strategy_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut native = StepEstimator::load(store.clone(), &settings(StepStrategy::Native));
        assert!(!native.handle(SensorReading::Acceleration(MotionSample::new(
            0.0, 0.0, 9.0, 0
        ))));

        let mut peak = StepEstimator::load(store, &settings(StepStrategy::Peak));
        assert!(!peak.handle(SensorReading::StepDelta(50)));
        assert_eq!(peak.total(), 0);
    }

    #[test]
    fn test_unavailable_freezes_total() {
        let store = Arc::new(MemoryStore::new());
        store.set(StorageKeys::TOTAL_STEPS, "777").unwrap();
        let mut estimator = StepEstimator::load(store, &settings(StepStrategy::Native));
        let rx = estimator.subscribe();

        estimator.mark_unavailable();
        let status = *rx.borrow();
        assert_eq!(status.availability, Availability::Unavailable);
        assert_eq!(status.steps, 777);
    }

    #[test]
    fn test_total_stream_sees_every_change() {
        let store = Arc::new(MemoryStore::new());
        let mut estimator = StepEstimator::load(store, &settings(StepStrategy::Native));
        let mut totals = estimator.stream_totals();
        let rx = estimator.subscribe();

        estimator.apply_delta(100);
        estimator.apply_delta(0);
        estimator.apply_delta(100);
        estimator.apply_delta(100);

        assert_eq!(rx.borrow().steps, 300);
        let mut seen = Vec::new();
        while let Ok(total) = totals.try_recv() {
            seen.push(total);
        }
        assert_eq!(seen, vec![100, 200, 300]);
    }
}
