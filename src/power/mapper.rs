//! Step total to power level mapping
//!
//! A level is earned every `steps_per_level` steps:
//! `level = total / steps_per_level`, and the steps still missing for the
//! next level are `steps_per_level - total % steps_per_level`.

use std::num::NonZeroU64;

use serde::Serialize;

/// Maps a step total to a power level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerMapper {
    steps_per_level: NonZeroU64,
}

impl PowerMapper {
    pub fn new(steps_per_level: NonZeroU64) -> Self {
        Self { steps_per_level }
    }

    pub fn steps_per_level(&self) -> u64 {
        self.steps_per_level.get()
    }

    /// Power level for a step total
    pub fn level(&self, total: u64) -> u64 {
        total / self.steps_per_level.get()
    }

    /// Steps left until the next level, always in `1..=steps_per_level`
    pub fn remaining(&self, total: u64) -> u64 {
        let spl = self.steps_per_level.get();
        spl - (total % spl)
    }

    /// Full view of a step total
    pub fn snapshot(&self, total: u64) -> PowerSnapshot {
        PowerSnapshot {
            steps: total,
            power_level: self.level(total),
            steps_to_next: self.remaining(total),
            steps_per_level: self.steps_per_level.get(),
        }
    }
}

impl Default for PowerMapper {
    fn default() -> Self {
        Self::new(NonZeroU64::new(100).expect("non-zero literal"))
    }
}

/// Step progress handed to the presentation layer on every update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSnapshot {
    pub steps: u64,
    pub power_level: u64,
    pub steps_to_next: u64,
    #[serde(skip)]
    pub steps_per_level: u64,
}

impl PowerSnapshot {
    /// Progress through the current level (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        let spl = self.steps_per_level.max(1);
        let into_level = self.steps % spl;
        (into_level as f32) / (spl as f32)
    }
}
