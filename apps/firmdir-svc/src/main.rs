//! firmdir synchronization service.
//!
//! Background service keeping the local provider directory consistent with
//! the authoritative PDA feed. Every instance runs the same periodic worker;
//! the distributed lock in the database ensures a single instance performs
//! each reconciliation cycle.

mod config;
mod logging;

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use config::Config;
use firmdir_db::{run_migrations, DbPool};
use firmdir_feed::FeedClient;
use firmdir_sync::{
    LockService, PgDirectoryStore, PgLeaseStore, SyncWorker, SyncWorkerConfig,
};

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values).
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.log_filter);

    let pool = match DbPool::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    if !config.sync_enabled {
        info!("Synchronization disabled by configuration, exiting");
        return;
    }

    let store = Arc::new(PgDirectoryStore::new(pool.inner().clone()));
    let lock = LockService::new(PgLeaseStore::new(pool.inner().clone()));
    let feed = FeedClient::new(config.feed_source.clone());

    info!(
        feed = %feed.source(),
        interval_secs = config.sync_interval.as_secs(),
        lease_secs = config.sync_lease.as_secs(),
        mode = %config.worker_mode,
        owner = %lock.owner(),
        "Starting firmdir sync service"
    );

    let worker = Arc::new(SyncWorker::new(
        feed,
        store,
        lock,
        SyncWorkerConfig {
            interval: config.sync_interval,
            lease: config.sync_lease,
            mode: config.worker_mode,
            ..SyncWorkerConfig::default()
        },
    ));

    let handle = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }

    worker.shutdown();
    if let Err(e) = handle.await {
        error!(error = %e, "Worker task ended abnormally");
    }

    info!("firmdir sync service stopped");
}
