//! Step detection by peak-picking over accelerometer magnitude
//!
//! Each sample's magnitude `sqrt(x² + y² + z²)` (in g) joins a sliding
//! window. A step is a sample whose magnitude rises more than
//! `peak_threshold - 1` above the window mean, at least `refractory_ms`
//! after the previous step.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::PedometerSettings;

/// One 3-axis accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Milliseconds on any monotonic clock
    #[serde(rename = "t")]
    pub timestamp_ms: u64,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Sliding-window peak detector. All state belongs to the instance.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    window: VecDeque<f64>,
    capacity: usize,
    /// Required rise above the window mean
    excess: f64,
    refractory_ms: u64,
    last_step_ms: Option<u64>,
}

impl PeakDetector {
    pub fn new(settings: &PedometerSettings) -> Self {
        let capacity = settings.window_size.get();
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            excess: settings.peak_threshold - 1.0,
            refractory_ms: settings.refractory_ms,
            last_step_ms: None,
        }
    }

    /// Feed one sample; returns `true` when it is a step
    pub fn observe(&mut self, sample: &MotionSample) -> bool {
        let magnitude = sample.magnitude();
        if !magnitude.is_finite() {
            return false;
        }

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(magnitude);

        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        if magnitude <= mean + self.excess {
            return false;
        }

        let rested = match self.last_step_ms {
            Some(last) => sample.timestamp_ms.saturating_sub(last) >= self.refractory_ms,
            None => true,
        };
        if !rested {
            return false;
        }

        self.last_step_ms = Some(sample.timestamp_ms);
        true
    }

    /// Running mean of the current window (0 when empty)
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still(t: u64) -> MotionSample {
        MotionSample::new(0.0, 0.0, 1.0, t)
    }

    fn spike(t: u64) -> MotionSample {
        MotionSample::new(0.3, 0.4, 1.5, t)
    }

    #[test]
    fn test_magnitude() {
        assert!((MotionSample::new(3.0, 4.0, 0.0, 0).magnitude() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_resting_signal_has_no_steps() {
        let mut detector = PeakDetector::new(&PedometerSettings::default());
        for i in 0..50 {
            assert!(!detector.observe(&still(i * 100)));
        }
        assert!((detector.mean() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spike_over_baseline_is_a_step() {
        let mut detector = PeakDetector::new(&PedometerSettings::default());
        for i in 0..10 {
            detector.observe(&still(i * 100));
        }
        assert!(detector.observe(&spike(1000)));
    }

    #[test]
    fn test_first_sample_never_counts() {
        let mut detector = PeakDetector::new(&PedometerSettings::default());
        assert!(!detector.observe(&spike(0)));
    }

    #[test]
    fn test_refractory_period() {
        let mut detector = PeakDetector::new(&PedometerSettings::default());
        for i in 0..10 {
            detector.observe(&still(i * 100));
        }
        assert!(detector.observe(&spike(1000)));
        // 100 ms later: still a peak, but too soon
        detector.observe(&still(1050));
        assert!(!detector.observe(&MotionSample::new(0.0, 0.0, 2.0, 1100)));

        for i in 0..10 {
            detector.observe(&still(1200 + i * 10));
        }
        // 300 ms after the last step is enough
        assert!(detector.observe(&MotionSample::new(0.0, 0.0, 2.0, 1300)));
    }

    #[test]
    fn test_small_bump_is_ignored() {
        let mut detector = PeakDetector::new(&PedometerSettings::default());
        for i in 0..10 {
            detector.observe(&still(i * 100));
        }
        assert!(!detector.observe(&MotionSample::new(0.0, 0.0, 1.1, 1000)));
    }

    #[test]
    fn test_detectors_are_independent() {
        let settings = PedometerSettings::default();
        let mut a = PeakDetector::new(&settings);
        let mut b = PeakDetector::new(&settings);
        for i in 0..10 {
            a.observe(&still(i * 100));
        }
        assert!(a.observe(&spike(1000)));
        assert!(!b.observe(&spike(1000)));
        assert!((b.mean() - spike(0).magnitude()).abs() < 1e-9);
    }
}
