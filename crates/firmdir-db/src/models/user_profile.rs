//! User profile model and office association.
//!
//! A profile may operate from any number of offices. The association rows are
//! removed before an office is deleted so no profile is left referencing a
//! missing office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A user profile row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier.
    pub id: Uuid,
    /// Login email address.
    pub email: String,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Insert a new profile.
    pub async fn create<'e, E>(executor: E, email: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO user_profiles (email)
            VALUES ($1)
            RETURNING id, email, created_at, updated_at
            ",
        )
        .bind(email)
        .fetch_one(executor)
        .await
    }

    /// Permit this profile to operate from an office.
    pub async fn attach_office<'e, E>(
        executor: E,
        profile_id: Uuid,
        office_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            INSERT INTO user_profile_offices (user_profile_id, office_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(profile_id)
        .bind(office_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Detach an office from every profile that references it. Returns the
    /// number of associations removed.
    pub async fn detach_office_from_all<'e, E>(
        executor: E,
        office_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM user_profile_offices WHERE office_id = $1")
            .bind(office_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Offices this profile may operate from.
    pub async fn office_ids<'e, E>(executor: E, profile_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"
            SELECT office_id
            FROM user_profile_offices
            WHERE user_profile_id = $1
            ORDER BY office_id
            ",
        )
        .bind(profile_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
