//! Update worker owning every mutation of the sample store.
//!
//! Push handlers hand samples to the worker through an [`UpdateHandle`]. The worker
//! applies one event at a time: either a delivered sample (upsert) or a sweep tick
//! (removal of expired samples). A submitter stays suspended until the worker has
//! applied its sample, so pushes are backpressured by the worker. A push can
//! therefore wait for the duration of a concurrent sweep.

use chrono::Utc;
use shared::models::Sample;
use shared::storage::SampleStore;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Errors returned to a push handler submitting a sample.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The worker stopped or failed to apply the sample.
    #[error("update worker is not available")]
    WorkerUnavailable,

    /// The worker did not apply the sample within the configured push timeout.
    #[error("update worker did not accept the sample within {0:?}")]
    Timeout(Duration),
}

/// A sample waiting to be applied, with the channel used to release its submitter.
#[derive(Debug)]
struct Update {
    sample: Sample,
    applied: oneshot::Sender<()>,
}

/// Cloneable mailbox handle for submitting samples to the update worker.
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    tx: mpsc::Sender<Update>,
    timeout: Option<Duration>,
}

impl UpdateHandle {
    /// Hands a sample to the worker and waits until it has been applied.
    ///
    /// Without a timeout this waits as long as the worker is alive. With a timeout,
    /// a sample that was already handed over may still be applied after the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the worker has stopped or could not apply the sample
    /// - the configured timeout elapsed first
    pub async fn submit(&self, sample: Sample) -> Result<(), IngestError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.deliver(sample))
                .await
                .map_err(|_| IngestError::Timeout(limit))?,
            None => self.deliver(sample).await,
        }
    }

    async fn deliver(&self, sample: Sample) -> Result<(), IngestError> {
        let (applied, ack) = oneshot::channel();
        self.tx
            .send(Update { sample, applied })
            .await
            .map_err(|_| IngestError::WorkerUnavailable)?;
        ack.await.map_err(|_| IngestError::WorkerUnavailable)
    }
}

/// The single writer of the sample store.
pub struct UpdateWorker {
    store: Arc<dyn SampleStore>,
    rx: mpsc::Receiver<Update>,
    sweep_interval: Duration,
}

impl UpdateWorker {
    /// Creates a worker and the handle used to feed it.
    ///
    /// # Arguments
    ///
    /// * `store` - The store this worker mutates
    /// * `sweep_interval` - Time between sweeps of expired samples; must be non-zero
    /// * `push_timeout` - Optional bound on how long [`UpdateHandle::submit`] waits
    #[must_use]
    pub fn new(
        store: Arc<dyn SampleStore>,
        sweep_interval: Duration,
        push_timeout: Option<Duration>,
    ) -> (Self, UpdateHandle) {
        // One slot: a sender proceeds only once the worker has taken the previous update.
        let (tx, rx) = mpsc::channel(1);
        let worker = Self {
            store,
            rx,
            sweep_interval,
        };
        let handle = UpdateHandle {
            tx,
            timeout: push_timeout,
        };
        (worker, handle)
    }

    /// Spawns the worker onto the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, or if the sweep interval is zero.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the event loop until every [`UpdateHandle`] has been dropped.
    pub async fn run(mut self) {
        let mut sweep = interval_at(Instant::now() + self.sweep_interval, self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            sweep_interval_secs = self.sweep_interval.as_secs_f64(),
            "Update worker started"
        );

        loop {
            tokio::select! {
                update = self.rx.recv() => match update {
                    Some(update) => self.apply(update),
                    None => break,
                },
                _ = sweep.tick() => self.sweep(),
            }
        }

        tracing::info!("All update handles dropped, update worker stopped");
    }

    fn apply(&self, update: Update) {
        let Update { sample, applied } = update;
        let sensor_id = sample.id;

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.store.upsert(sample)));
        match result {
            Ok(()) => {
                tracing::trace!(sensor_id, "Sample applied");
                // The submitter may have timed out; the sample stays applied either way.
                let _ = applied.send(());
            }
            Err(_) => {
                // Dropping `applied` reports the failure to the submitter.
                tracing::error!(sensor_id, "Panic while applying sample, worker continues");
            }
        }
    }

    fn sweep(&self) {
        let now = Utc::now();
        match panic::catch_unwind(AssertUnwindSafe(|| self.store.sweep_expired(now))) {
            Ok(removed) => {
                tracing::debug!(
                    removed,
                    remaining = self.store.len(),
                    "Swept expired samples"
                );
            }
            Err(_) => {
                tracing::error!("Panic while sweeping expired samples, worker continues");
            }
        }
    }
}
