//! Firm model.
//!
//! A firm is an organization listed in the provider directory. Firms are
//! matched to feed records by their external `code` and are soft-deleted
//! (disabled) rather than removed when they drop out of the feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;
use uuid::Uuid;

/// Category of a firm in the provider directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmType {
    /// Directly authorized principal firm.
    Principal,
    /// Appointed representative operating under a principal.
    AppointedRepresentative,
    /// Independent brokerage.
    Broker,
}

impl fmt::Display for FirmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Principal => write!(f, "principal"),
            Self::AppointedRepresentative => write!(f, "appointed_representative"),
            Self::Broker => write!(f, "broker"),
        }
    }
}

impl std::str::FromStr for FirmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "principal" => Ok(Self::Principal),
            "appointed_representative" => Ok(Self::AppointedRepresentative),
            "broker" => Ok(Self::Broker),
            _ => Err(format!("Unknown firm type: {s}")),
        }
    }
}

/// Lifecycle state of a firm.
///
/// Firms are never physically deleted; a firm absent from the feed is
/// retained as `Disabled` and may be re-activated by a later feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmState {
    /// Present in the latest feed.
    Active,
    /// Absent from the latest feed, retained for history.
    Disabled,
}

/// A firm row in the provider directory.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Firm {
    /// Unique identifier.
    pub id: Uuid,
    /// External firm code, stable across feeds.
    pub code: String,
    /// Firm display name.
    pub name: String,
    /// Firm category, stored as text.
    pub firm_type: String,
    /// Whether the firm appeared in the latest feed.
    pub enabled: bool,
    /// Optional parent firm (one level deep).
    pub parent_firm_id: Option<Uuid>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Firm {
    /// Lifecycle state derived from the `enabled` column.
    #[must_use]
    pub fn state(&self) -> FirmState {
        if self.enabled {
            FirmState::Active
        } else {
            FirmState::Disabled
        }
    }

    /// Parse the stored firm type.
    pub fn firm_type(&self) -> Result<FirmType, String> {
        self.firm_type.parse()
    }

    /// Insert a new firm. The firm starts enabled with no parent; parent
    /// linkage is resolved in a later pass once all firms exist.
    pub async fn create<'e, E>(executor: E, input: &NewFirm) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO firms (code, name, firm_type, enabled)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, code, name, firm_type, enabled, parent_firm_id,
                      created_at, updated_at
            ",
        )
        .bind(&input.code)
        .bind(&input.name)
        .bind(input.firm_type.to_string())
        .fetch_one(executor)
        .await
    }

    /// Update name, type and enabled flag.
    pub async fn update_details<'e, E>(
        executor: E,
        id: Uuid,
        input: &FirmUpdate,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE firms
            SET name = $2, firm_type = $3, enabled = $4, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.firm_type.to_string())
        .bind(input.enabled)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Set or clear the parent firm reference.
    pub async fn set_parent<'e, E>(
        executor: E,
        id: Uuid,
        parent_firm_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE firms
            SET parent_firm_id = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(parent_firm_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Soft-delete a firm. Returns whether a row was changed.
    pub async fn disable<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE firms
            SET enabled = FALSE, updated_at = NOW()
            WHERE id = $1 AND enabled
            ",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Find a firm by its external code.
    pub async fn find_by_code<'e, E>(executor: E, code: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT id, code, name, firm_type, enabled, parent_firm_id,
                   created_at, updated_at
            FROM firms
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// List all enabled firms.
    pub async fn list_enabled<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT id, code, name, firm_type, enabled, parent_firm_id,
                   created_at, updated_at
            FROM firms
            WHERE enabled
            ORDER BY code
            ",
        )
        .fetch_all(executor)
        .await
    }
}

/// Input for creating a firm.
#[derive(Debug, Clone)]
pub struct NewFirm {
    pub code: String,
    pub name: String,
    pub firm_type: FirmType,
}

/// Input for updating a firm's details.
#[derive(Debug, Clone)]
pub struct FirmUpdate {
    pub name: String,
    pub firm_type: FirmType,
    pub enabled: bool,
}
