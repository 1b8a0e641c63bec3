//! Error Registry - Binary Entry Point
//!
//! Hosts one registry configured from `ERROR_REGISTRY_*` environment
//! variables: restores it from disk, runs the maintenance task until Ctrl+C,
//! then stops the task before exiting.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use error_registry::{ErrorRegistry, MaintenanceTask, RegistryConfig, TracingSink};

type MainResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> MainResult {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RegistryConfig::from_env()?;
    info!(
        "{} v{} starting (key: {}, primary: {}, recovery: {})",
        error_registry::NAME,
        error_registry::VERSION,
        config.key,
        config.primary_snapshot_path.display(),
        config.recovery_snapshot_path.display()
    );

    let registry = Arc::new(ErrorRegistry::open(config, Arc::new(TracingSink))?);
    let stats = registry.stats();
    info!(
        size = stats.size,
        max_size = stats.max_size,
        current = stats.current_count,
        acknowledged = stats.acknowledged_count,
        utilization = stats.utilization(),
        "registry ready"
    );
    if stats.is_full() {
        warn!(key = %stats.key, "registry restored at capacity, next add evicts");
    }

    let maintenance = MaintenanceTask::from_config(Arc::clone(&registry))?.spawn();

    let shutdown = Arc::new(Notify::new());
    let notify = Arc::clone(&shutdown);
    ctrlc::set_handler(move || notify.notify_one())?;

    shutdown.notified().await;
    info!("shutdown requested, stopping maintenance task");

    let ticks = maintenance.ticks();
    maintenance.stop().await;

    let stats = registry.stats();
    info!(
        ticks,
        size = stats.size,
        evicted = stats.evicted_count,
        "registry stopped"
    );

    Ok(())
}
