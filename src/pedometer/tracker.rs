//! Background step tracking
//!
//! Runs a [`StepEstimator`] against a [`MotionSource`] on a tokio task.
//! Dropping the [`TrackerHandle`] stops the task and releases the source, so
//! subscribing again never counts the same readings twice.
//!
//! The handle offers two views of the total: [`TrackerHandle::subscribe`]
//! for the latest status and [`TrackerHandle::next_total`] for every
//! individual change, which is what level-up detection consumes.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::estimator::{StepEstimator, StepStatus};
use super::sensor::{MotionSource, SensorError};

/// Spawns step tracking tasks
pub struct StepTracker;

impl StepTracker {
    /// Start tracking. Must be called inside a tokio runtime.
    pub fn spawn<S>(mut estimator: StepEstimator, source: S) -> TrackerHandle
    where
        S: MotionSource + 'static,
    {
        let status = estimator.subscribe();
        let totals = estimator.stream_totals();
        let task = tokio::spawn(run(estimator, source));
        TrackerHandle {
            status,
            totals,
            task: Some(task),
        }
    }
}

async fn run<S: MotionSource>(
    mut estimator: StepEstimator,
    mut source: S,
) -> Result<u64, SensorError> {
    if !source.is_available().await {
        estimator.mark_unavailable();
        return Err(SensorError::Unavailable);
    }
    estimator.mark_available();

    let mut readings = 0u64;
    while let Some(reading) = source.next_reading().await {
        // Persisting is a blocking store write, fine at sensor rates
        estimator.handle(reading);
        readings += 1;
    }

    tracing::debug!(
        "Motion source closed after {} readings, total {}",
        readings,
        estimator.total()
    );
    Ok(estimator.total())
}

/// Handle to a running tracker
pub struct TrackerHandle {
    status: watch::Receiver<StepStatus>,
    totals: mpsc::UnboundedReceiver<u64>,
    task: Option<JoinHandle<Result<u64, SensorError>>>,
}

impl TrackerHandle {
    /// Live step status
    pub fn subscribe(&self) -> watch::Receiver<StepStatus> {
        self.status.clone()
    }

    /// Latest published status
    pub fn current(&self) -> StepStatus {
        *self.status.borrow()
    }

    /// Next step total, in the order they were reached. Returns `None` once
    /// the tracker has stopped and every total has been delivered.
    pub async fn next_total(&mut self) -> Option<u64> {
        self.totals.recv().await
    }

    /// Wait for the source to end and return the final total
    pub async fn join(mut self) -> Result<u64, SensorError> {
        let Some(task) = self.task.take() else {
            return Ok(self.current().steps);
        };
        task.await
            .map_err(|e| SensorError::TrackerFailed(e.to_string()))?
    }

    /// Stop tracking now
    pub fn stop(self) {
        // Drop aborts the task
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
