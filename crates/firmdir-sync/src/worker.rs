//! Scheduled synchronization worker.
//!
//! Periodic loop shared by every service instance: each tick fetches a feed
//! snapshot and runs one reconciliation cycle under the distributed lock, so
//! exactly one instance does the work per interval. Contention is routine
//! and skips the cycle; every other failure is logged and swallowed so the
//! timer loop survives indefinitely.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use firmdir_feed::FeedClient;

use crate::compare::ComparisonEngine;
use crate::lock::{LeaseStore, LockService};
use crate::store::DirectoryStore;
use crate::synchronize::SyncEngine;

/// What the worker does with each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    /// Apply the feed to the directory.
    Synchronize,
    /// Compute and log the diff without mutating anything.
    ReportOnly,
}

impl fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synchronize => write!(f, "synchronize"),
            Self::ReportOnly => write!(f, "report-only"),
        }
    }
}

impl std::str::FromStr for WorkerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synchronize" | "sync" => Ok(Self::Synchronize),
            "report-only" | "report_only" | "report" => Ok(Self::ReportOnly),
            _ => Err(format!("Unknown worker mode: {s}")),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct SyncWorkerConfig {
    /// How often to attempt a cycle.
    pub interval: Duration,
    /// Lease duration for the cycle's lock; bounds the staleness a crashed
    /// run can cause.
    pub lease: Duration,
    /// Name of the lock shared by all instances.
    pub lock_key: String,
    /// Whether cycles apply changes or only report them.
    pub mode: WorkerMode,
}

impl Default for SyncWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900),
            lease: Duration::from_secs(600),
            lock_key: "pda-sync".to_string(),
            mode: WorkerMode::Synchronize,
        }
    }
}

/// Periodic reconciliation worker.
pub struct SyncWorker<S, L> {
    feed: FeedClient,
    sync_engine: SyncEngine<S>,
    comparison_engine: ComparisonEngine<S>,
    lock: LockService<L>,
    config: SyncWorkerConfig,
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl<S, L> SyncWorker<S, L>
where
    S: DirectoryStore,
    L: LeaseStore,
{
    /// Create a worker over a feed client, directory store and lock service.
    pub fn new(
        feed: FeedClient,
        store: Arc<S>,
        lock: LockService<L>,
        config: SyncWorkerConfig,
    ) -> Self {
        Self {
            feed,
            sync_engine: SyncEngine::new(store.clone()),
            comparison_engine: ComparisonEngine::new(store),
            lock,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    /// Run the periodic loop until shutdown is requested.
    ///
    /// Spawn this on its own task; cycles run on the runtime's worker pool
    /// and never block the timer.
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            lease_secs = self.config.lease.as_secs(),
            lock_key = %self.config.lock_key,
            mode = %self.config.mode,
            "Starting directory sync worker"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    self.run_cycle().await;
                }
                () = self.shutdown_notify.notified() => {
                    info!("Worker shutdown requested, stopping loop");
                    break;
                }
            }
        }

        info!("Sync worker stopped");
    }

    /// Request graceful shutdown. An in-flight cycle is allowed to finish.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_one();
    }

    /// Check if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// One reconciliation cycle: fetch a snapshot, then run the configured
    /// engine under the shared lock.
    async fn run_cycle(&self) {
        let snapshot = match self.feed.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, source = %self.feed.source(), "Feed fetch failed, skipping cycle");
                return;
            }
        };

        match self.config.mode {
            WorkerMode::Synchronize => {
                let outcome = self
                    .lock
                    .with_lock(&self.config.lock_key, self.config.lease, || {
                        self.sync_engine.synchronize_with_pda(&snapshot)
                    })
                    .await;

                match outcome {
                    Ok(report) => info!(
                        firms_created = report.firms_created,
                        firms_updated = report.firms_updated,
                        firms_disabled = report.firms_disabled,
                        offices_created = report.offices_created,
                        offices_updated = report.offices_updated,
                        offices_deleted = report.offices_deleted,
                        "Synchronization cycle complete"
                    ),
                    Err(e) if e.is_contention() => {
                        debug!(lock_key = %self.config.lock_key, "Cycle skipped, lock contended");
                    }
                    Err(e) => error!(error = %e, "Synchronization cycle failed"),
                }
            }
            WorkerMode::ReportOnly => {
                let outcome = self
                    .lock
                    .with_lock(&self.config.lock_key, self.config.lease, || {
                        self.comparison_engine.compare_with_database(&snapshot)
                    })
                    .await;

                match outcome {
                    Ok(report) => info!(
                        changes = report.total_changes(),
                        firm_creates = report.firm_creates,
                        firm_updates = report.firm_updates,
                        firm_disables = report.firm_disables,
                        office_creates = report.office_creates,
                        office_updates = report.office_updates,
                        office_deletes = report.office_deletes,
                        "Comparison cycle complete"
                    ),
                    Err(e) if e.is_contention() => {
                        debug!(lock_key = %self.config.lock_key, "Cycle skipped, lock contended");
                    }
                    Err(e) => error!(error = %e, "Comparison cycle failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SyncWorkerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(900));
        assert_eq!(config.lease, Duration::from_secs(600));
        assert_eq!(config.lock_key, "pda-sync");
        assert_eq!(config.mode, WorkerMode::Synchronize);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("sync".parse::<WorkerMode>().unwrap(), WorkerMode::Synchronize);
        assert_eq!(
            "report-only".parse::<WorkerMode>().unwrap(),
            WorkerMode::ReportOnly
        );
        assert!("apply".parse::<WorkerMode>().is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(WorkerMode::Synchronize.to_string(), "synchronize");
        assert_eq!(WorkerMode::ReportOnly.to_string(), "report-only");
    }
}
