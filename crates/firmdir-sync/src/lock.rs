//! Distributed lock service.
//!
//! Grants a time-boxed, named lease so only one caller across all service
//! instances runs a protected block at a time. Acquisition is one atomic
//! conditional write against the lease store; there is no read-then-write
//! window. A crashed holder is handled by lease expiry alone.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use firmdir_db::DistributedLock;

use crate::store::StoreError;

/// Narrow lease-storage interface behind the lock service.
///
/// Any backend supporting an atomic conditional write can implement this;
/// the engines never see the backend directly.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Take the lease if it is free or expired. Returns whether it was taken.
    async fn try_acquire(&self, key: &str, owner: &str, lease: Duration)
        -> Result<bool, StoreError>;

    /// Release the lease if `owner` still holds it. Returns whether a lease
    /// was released.
    async fn release(&self, key: &str, owner: &str) -> Result<bool, StoreError>;
}

/// Postgres-backed lease store over the `distributed_locks` table.
///
/// Runs every statement directly on the pool, so a release commits on its
/// own connection regardless of any transaction the caller has open.
#[derive(Debug, Clone)]
pub struct PgLeaseStore {
    pool: PgPool,
}

impl PgLeaseStore {
    /// Create a lease store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaseStore for PgLeaseStore {
    async fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        Ok(DistributedLock::try_acquire(&self.pool, key, owner, lease.as_secs_f64()).await?)
    }

    async fn release(&self, key: &str, owner: &str) -> Result<bool, StoreError> {
        Ok(DistributedLock::release(&self.pool, key, owner).await?)
    }
}

/// Errors from [`LockService::with_lock`].
#[derive(Debug, Error)]
pub enum LockError<E: std::error::Error> {
    /// Another holder's lease is still current. Expected under normal
    /// operation; the protected action was not run.
    #[error("lock '{key}' is held by another instance")]
    Contended { key: String },

    /// The lease store itself failed.
    #[error("lease store failure: {0}")]
    Lease(#[source] StoreError),

    /// The protected action ran and failed.
    #[error(transparent)]
    Action(E),
}

impl<E: std::error::Error> LockError<E> {
    /// Whether this is routine contention rather than a failure.
    #[must_use]
    pub fn is_contention(&self) -> bool {
        matches!(self, LockError::Contended { .. })
    }
}

/// Mutual exclusion across service instances for named jobs.
pub struct LockService<L> {
    store: L,
    owner: String,
}

impl<L: LeaseStore> LockService<L> {
    /// Create a service with a fresh per-instance owner token.
    #[must_use]
    pub fn new(store: L) -> Self {
        Self {
            store,
            owner: Uuid::new_v4().to_string(),
        }
    }

    /// Create a service with an explicit owner token.
    pub fn with_owner(store: L, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
        }
    }

    /// This instance's owner token.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Run `action` under the named lease.
    ///
    /// If the lease cannot be taken, returns [`LockError::Contended`] without
    /// running `action`. Otherwise the lease is released after `action`
    /// completes, whether it succeeded or failed; a failed release is logged
    /// and the action's outcome still stands, since the lease will expire on
    /// its own.
    pub async fn with_lock<F, Fut, T, E>(
        &self,
        key: &str,
        lease: Duration,
        action: F,
    ) -> Result<T, LockError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        let acquired = self
            .store
            .try_acquire(key, &self.owner, lease)
            .await
            .map_err(LockError::Lease)?;

        if !acquired {
            tracing::debug!(key, "Lease held by another instance, skipping");
            return Err(LockError::Contended {
                key: key.to_string(),
            });
        }

        tracing::debug!(key, owner = %self.owner, lease_secs = lease.as_secs(), "Lease acquired");
        let result = action().await;

        match self.store.release(key, &self.owner).await {
            Ok(true) => tracing::debug!(key, "Lease released"),
            Ok(false) => tracing::warn!(key, "Lease had already expired before release"),
            Err(e) => tracing::warn!(key, error = %e, "Failed to release lease"),
        }

        result.map_err(LockError::Action)
    }
}
