//! Pedometer: turns motion into a durable step total
//!
//! # Architecture
//!
//! ```text
//! MotionSource ──readings──▶ StepEstimator ──watch──▶ subscribers
//!  (channel/replay)            │   (delta or peak)
//!                              ▼
//!                         KeyValueStore (total_steps)
//! ```
//!
//! Two strategies are supported and exactly one is active per estimator:
//! platform step deltas (`native`) or peak detection over accelerometer
//! samples (`peak`).

mod estimator;
mod peak;
mod sensor;
mod tracker;

pub use estimator::{Availability, StepEstimator, StepStatus};
pub use peak::{MotionSample, PeakDetector};
pub use sensor::{ChannelSource, MotionSource, ReplaySource, SensorError, SensorReading};
pub use tracker::{StepTracker, TrackerHandle};
