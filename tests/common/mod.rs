//! Shared test utilities for stepdex integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use stepdex::config::{PedometerSettings, StepStrategy};
use stepdex::pedometer::MotionSample;
use stepdex::storage::{SharedStore, SqliteStore};

/// An on-disk store inside a temp dir that lives as long as the returned guard
pub struct TestStore {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("stepdex.db");
        Self { dir, path }
    }

    /// Open (or reopen, simulating an app restart) the store
    pub fn open(&self) -> SharedStore {
        Arc::new(SqliteStore::open(&self.path).expect("Failed to open store"))
    }
}

pub fn pedometer(strategy: StepStrategy) -> PedometerSettings {
    PedometerSettings {
        strategy,
        ..PedometerSettings::default()
    }
}

/// Accelerometer trace with `steps` clear peaks, spaced 500 ms apart over a
/// 1 g resting baseline sampled every 100 ms
pub fn walking_trace(steps: usize) -> Vec<MotionSample> {
    let mut samples = Vec::new();
    let mut t = 0u64;
    for _ in 0..steps {
        for _ in 0..4 {
            samples.push(MotionSample::new(0.0, 0.0, 1.0, t));
            t += 100;
        }
        samples.push(MotionSample::new(0.2, 0.3, 1.7, t));
        t += 100;
    }
    samples
}
