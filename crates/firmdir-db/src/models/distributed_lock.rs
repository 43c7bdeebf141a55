//! Distributed lock model.
//!
//! One row per lock key. Acquisition is a single conditional upsert so there
//! is no read-then-write window between checking expiry and taking the lease.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// A distributed lock row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DistributedLock {
    /// Lock name.
    pub key: String,
    /// Lease expiry; the row is acquirable by anyone once this is past.
    pub locked_until: DateTime<Utc>,
    /// Owner token of the current holder.
    pub locked_by: String,
}

impl DistributedLock {
    /// Attempt to take the lease for `lease_secs` seconds.
    ///
    /// Inserts the row if absent, or overwrites it only when the existing
    /// lease has already expired. Returns whether the lease was taken; `false`
    /// means another holder's lease is still current.
    pub async fn try_acquire<'e, E>(
        executor: E,
        key: &str,
        owner: &str,
        lease_secs: f64,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            INSERT INTO distributed_locks (key, locked_until, locked_by)
            VALUES ($1, NOW() + make_interval(secs => $2), $3)
            ON CONFLICT (key) DO UPDATE
            SET locked_until = EXCLUDED.locked_until,
                locked_by = EXCLUDED.locked_by
            WHERE distributed_locks.locked_until < NOW()
            ",
        )
        .bind(key)
        .bind(lease_secs)
        .bind(owner)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Release the lease if `owner` still holds it. Returns whether a row was
    /// removed; `false` means the lease expired and was taken by someone else.
    pub async fn release<'e, E>(executor: E, key: &str, owner: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            DELETE FROM distributed_locks
            WHERE key = $1 AND locked_by = $2
            ",
        )
        .bind(key)
        .bind(owner)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Look up the current lock row.
    pub async fn find<'e, E>(executor: E, key: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT key, locked_until, locked_by
            FROM distributed_locks
            WHERE key = $1
            ",
        )
        .bind(key)
        .fetch_optional(executor)
        .await
    }
}
