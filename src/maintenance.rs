//! Periodic maintenance task
//!
//! Every `interval` the task writes the newest `retention_limit` records to
//! the recovery snapshot and then empties the registry. Between ticks recent
//! errors are queryable in memory; afterwards only the capped sample on disk
//! remains.
//!
//! The task runs on tokio and is stopped through its `MaintenanceHandle`,
//! either explicitly with `stop()` or by dropping the handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::ErrorRegistry;

/// Run one maintenance tick synchronously.
///
/// Returns the number of records written to the recovery snapshot. The
/// registry is cleared even when the snapshot write fails; only a zero
/// limit leaves it untouched.
pub fn run_once(registry: &ErrorRegistry, retention_limit: usize) -> RegistryResult<usize> {
    registry.rotate(retention_limit)
}

/// Periodic snapshot-and-clear over one registry
pub struct MaintenanceTask {
    registry: Arc<ErrorRegistry>,
    interval: Duration,
    retention_limit: usize,
}

impl MaintenanceTask {
    pub fn new(
        registry: Arc<ErrorRegistry>,
        interval: Duration,
        retention_limit: usize,
    ) -> RegistryResult<Self> {
        if interval.is_zero() {
            return Err(RegistryError::InvalidArgument(
                "maintenance interval must be greater than zero".to_string(),
            ));
        }
        if retention_limit == 0 {
            return Err(RegistryError::InvalidLimit(retention_limit));
        }

        Ok(Self {
            registry,
            interval,
            retention_limit,
        })
    }

    /// Use the interval and retention limit from the registry's config
    pub fn from_config(registry: Arc<ErrorRegistry>) -> RegistryResult<Self> {
        let interval = registry.config().maintenance_interval;
        let limit = registry.config().retention_limit;
        Self::new(registry, interval, limit)
    }

    /// Spawn onto the current tokio runtime. The first tick fires one
    /// interval from now.
    pub fn spawn(self) -> MaintenanceHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicU64::new(0));
        let task_ticks = Arc::clone(&ticks);

        let join = tokio::spawn(self.run(shutdown_rx, task_ticks));

        MaintenanceHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            ticks,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>, ticks: Arc<AtomicU64>) {
        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            key = %self.registry.key(),
            interval_ms = self.interval.as_millis() as u64,
            retention_limit = self.retention_limit,
            "maintenance task started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped handle counts as a stop request
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = timer.tick() => {
                    // Snapshot writes fsync under the registry lock
                    let registry = Arc::clone(&self.registry);
                    let limit = self.retention_limit;
                    let done = tokio::task::spawn_blocking(move || tick(&registry, limit)).await;
                    if let Err(e) = done {
                        error!(key = %self.registry.key(), error = %e, "maintenance tick did not complete");
                    }
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        info!(key = %self.registry.key(), "maintenance task stopped");
    }
}

fn tick(registry: &ErrorRegistry, retention_limit: usize) {
    match run_once(registry, retention_limit) {
        Ok(saved) => info!(
            key = %registry.key(),
            saved,
            "saved recovery snapshot and cleared in-memory errors"
        ),
        Err(e) => {
            error!(
                key = %registry.key(),
                path = %registry.snapshots().recovery_path().display(),
                error = %e,
                "recovery snapshot failed"
            );
            registry.sink.persistence_failed(registry.key(), &e);
        }
    }
}

/// Owner's handle on a running maintenance task
pub struct MaintenanceHandle {
    shutdown: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl MaintenanceHandle {
    /// Ask the task to stop and wait for it to finish
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                warn!(error = %e, "maintenance task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |j| j.is_finished())
    }

    /// Number of ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
