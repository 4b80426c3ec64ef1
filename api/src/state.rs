//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers. It is
//! built once at startup and replaces process-wide globals: the sample store, the
//! liveness marker, the update worker's mailbox, and the Prometheus registry all
//! live here.

use chrono::TimeDelta;
use prometheus::Registry;
use shared::naming::{DomoticzNaming, NamingPolicy};
use shared::storage::{InMemorySampleStore, SampleStore};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::metrics::{LastPush, SampleCollector};
use crate::worker::{UpdateHandle, UpdateWorker};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The sample store. Written only by the update worker.
    store: Arc<dyn SampleStore>,
    /// The policy naming exported metrics.
    naming: Arc<dyn NamingPolicy>,
    /// Timestamp of the last successful push.
    last_push: Arc<LastPush>,
    /// Mailbox of the update worker.
    updates: UpdateHandle,
    /// Registry holding the sample collector.
    registry: Registry,
    /// How long a sample lives without updates.
    expiry_horizon: TimeDelta,
}

impl AppState {
    /// Creates application state around an already running update worker.
    ///
    /// The sample collector is registered in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the collector cannot be registered.
    pub fn new(
        store: Arc<dyn SampleStore>,
        naming: Arc<dyn NamingPolicy>,
        updates: UpdateHandle,
        expiry_horizon: TimeDelta,
    ) -> prometheus::Result<Self> {
        let last_push = Arc::new(LastPush::new());
        let registry = Registry::new();
        registry.register(Box::new(SampleCollector::new(
            Arc::clone(&store),
            Arc::clone(&last_push),
        )?))?;

        Ok(Self {
            store,
            naming,
            last_push,
            updates,
            registry,
            expiry_horizon,
        })
    }

    /// Creates application state from configuration, spawning the update worker.
    ///
    /// The worker stops once every clone of the returned state has been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the collector cannot
    /// be registered.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn from_config(config: &Config) -> anyhow::Result<(Self, JoinHandle<()>)> {
        config.validate()?;

        let store: Arc<dyn SampleStore> = Arc::new(InMemorySampleStore::new());
        let (worker, updates) = UpdateWorker::new(
            Arc::clone(&store),
            config.sweep_interval(),
            config.push_timeout(),
        );
        let state = Self::new(
            store,
            Arc::new(DomoticzNaming::new(config.metric_prefix.clone())),
            updates,
            config.expiry_horizon()?,
        )?;

        Ok((state, worker.spawn()))
    }

    /// Creates application state with an in-memory store and default settings.
    ///
    /// This is useful for development and testing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn with_in_memory_store() -> Self {
        Self::from_config(&Config::default())
            .map(|(state, _worker)| state)
            .expect("default configuration is valid")
    }

    /// Returns a reference to the sample store.
    #[must_use]
    pub fn store(&self) -> &dyn SampleStore {
        self.store.as_ref()
    }

    /// Returns a reference to the naming policy.
    #[must_use]
    pub fn naming(&self) -> &dyn NamingPolicy {
        self.naming.as_ref()
    }

    /// Returns the liveness marker.
    #[must_use]
    pub fn last_push(&self) -> &LastPush {
        &self.last_push
    }

    /// Returns the update worker's mailbox.
    #[must_use]
    pub fn updates(&self) -> &UpdateHandle {
        &self.updates
    }

    /// Returns the Prometheus registry served on the metrics path.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns how long a sample lives without updates.
    #[must_use]
    pub fn expiry_horizon(&self) -> TimeDelta {
        self.expiry_horizon
    }
}
