//! Motion sensing sources
//!
//! A [`MotionSource`] is whatever delivers step deltas or accelerometer
//! samples: a platform bridge feeding a channel, or a recorded trace.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::peak::MotionSample;

/// One reading from a motion source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    /// Steps counted by a platform step counter since the previous event
    StepDelta(u32),
    /// Raw accelerometer sample
    Acceleration(MotionSample),
}

/// Errors from the sensing side
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("Motion sensing is not available on this device")]
    Unavailable,

    #[error("Step tracker stopped unexpectedly: {0}")]
    TrackerFailed(String),
}

/// Source of motion readings
#[async_trait]
pub trait MotionSource: Send + Sync {
    /// Whether the sensing capability exists on this device
    async fn is_available(&self) -> bool;

    /// Next reading, or `None` once the source is exhausted or closed
    async fn next_reading(&mut self) -> Option<SensorReading>;
}

/// Source fed through a channel by the host platform
pub struct ChannelSource {
    rx: mpsc::Receiver<SensorReading>,
    available: bool,
}

impl ChannelSource {
    /// Create an available source and the sender that feeds it
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<SensorReading>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { rx, available: true }, tx)
    }

    /// A source on a device without the capability
    pub fn unavailable() -> Self {
        let (_tx, rx) = mpsc::channel(1);
        Self {
            rx,
            available: false,
        }
    }
}

#[async_trait]
impl MotionSource for ChannelSource {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn next_reading(&mut self) -> Option<SensorReading> {
        self.rx.recv().await
    }
}

/// A line of a recorded trace
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceLine {
    Delta {
        delta: u32,
    },
    Sample {
        x: f64,
        y: f64,
        z: f64,
        #[serde(default)]
        t: Option<u64>,
    },
}

/// Replays a JSON-lines trace file.
///
/// Each non-empty line is either `{"delta": 12}` or
/// `{"x": 0.1, "y": 0.2, "z": 1.0, "t": 1200}`. Lines starting with `#`
/// are comments. Samples without `t` are spaced `sample_interval_ms` apart.
pub struct ReplaySource {
    readings: VecDeque<SensorReading>,
    pacing: Option<Duration>,
}

impl ReplaySource {
    /// Load a trace file
    pub fn open(path: &Path, sample_interval_ms: u64) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {}", path.display()))?;
        Self::parse(&content, sample_interval_ms)
            .with_context(|| format!("Failed to parse trace file: {}", path.display()))
    }

    /// Parse trace content
    pub fn parse(content: &str, sample_interval_ms: u64) -> Result<Self> {
        let mut readings = VecDeque::new();
        let mut sample_index = 0u64;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parsed: TraceLine = serde_json::from_str(line)
                .with_context(|| format!("Invalid reading on line {}", line_no + 1))?;

            let reading = match parsed {
                TraceLine::Delta { delta } => SensorReading::StepDelta(delta),
                TraceLine::Sample { x, y, z, t } => {
                    let timestamp_ms = t.unwrap_or(sample_index * sample_interval_ms);
                    sample_index += 1;
                    SensorReading::Acceleration(MotionSample::new(x, y, z, timestamp_ms))
                }
            };
            readings.push_back(reading);
        }

        Ok(Self {
            readings,
            pacing: None,
        })
    }

    /// Wait this long before each reading, to replay in real time
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[async_trait]
impl MotionSource for ReplaySource {
    async fn is_available(&self) -> bool {
        true
    }

    async fn next_reading(&mut self) -> Option<SensorReading> {
        let reading = self.readings.pop_front()?;
        if let Some(pacing) = self.pacing {
            tokio::time::sleep(pacing).await;
        }
        Some(reading)
    }
}
