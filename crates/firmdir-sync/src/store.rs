//! Directory store seam.
//!
//! The engines read and mutate the persisted directory through the
//! [`DirectoryStore`] trait rather than a concrete database handle, so tests
//! drive them against an in-memory implementation and the production backend
//! stays swappable. [`PgDirectoryStore`] is the Postgres implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use firmdir_db::models::firm::{Firm, FirmUpdate, NewFirm};
use firmdir_db::models::office::{NewOffice, Office};
use firmdir_db::models::user_profile::UserProfile;
use firmdir_db::{FirmType, OfficeAddress};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a directory store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(#[source] sqlx::Error),

    /// A persisted row could not be interpreted.
    #[error("stored row invalid: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err)
    }
}

/// A firm as the engines see it: typed category and the parent's external
/// code instead of its row id.
#[derive(Debug, Clone)]
pub struct FirmRecord {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub firm_type: FirmType,
    pub enabled: bool,
    pub parent_code: Option<String>,
}

/// An office as the engines see it.
#[derive(Debug, Clone)]
pub struct OfficeRecord {
    pub id: Uuid,
    pub code: String,
    pub address: OfficeAddress,
}

/// A new office to persist for a firm.
#[derive(Debug, Clone)]
pub struct OfficeWrite {
    pub code: String,
    pub address: OfficeAddress,
}

/// An address change for an existing office.
#[derive(Debug, Clone)]
pub struct OfficeUpdate {
    pub office_id: Uuid,
    pub address: OfficeAddress,
}

/// Parent-link adjustment for a firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    /// Leave the stored parent untouched.
    Unchanged,
    /// Point the firm at this parent.
    Set(Uuid),
    /// Remove the parent reference.
    Clear,
}

/// All changes for one firm-and-its-offices unit of work.
///
/// Applied atomically: either every change in the set is visible to other
/// readers or none is.
#[derive(Debug, Clone)]
pub struct FirmChangeSet {
    pub firm_id: Uuid,
    pub parent: ParentLink,
    pub office_creates: Vec<OfficeWrite>,
    pub office_updates: Vec<OfficeUpdate>,
    pub office_deletes: Vec<Uuid>,
}

impl FirmChangeSet {
    /// A changeset that would touch nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.parent == ParentLink::Unchanged
            && self.office_creates.is_empty()
            && self.office_updates.is_empty()
            && self.office_deletes.is_empty()
    }
}

/// Storage operations the reconciliation engines depend on.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Look up a firm by its external code.
    async fn find_firm_by_code(&self, code: &str) -> StoreResult<Option<FirmRecord>>;

    /// All firms currently enabled.
    async fn list_enabled_firms(&self) -> StoreResult<Vec<FirmRecord>>;

    /// Insert a firm (enabled, no parent).
    async fn create_firm(&self, firm: &NewFirm) -> StoreResult<FirmRecord>;

    /// Update a firm's name, type and enabled flag.
    async fn update_firm(&self, firm_id: Uuid, update: &FirmUpdate) -> StoreResult<()>;

    /// Soft-delete a firm. Returns whether the firm was still enabled.
    async fn disable_firm(&self, firm_id: Uuid) -> StoreResult<bool>;

    /// All offices of a firm.
    async fn offices_of_firm(&self, firm_id: Uuid) -> StoreResult<Vec<OfficeRecord>>;

    /// Apply one firm's parent link and office changes in a single
    /// transaction. Deleted offices are detached from every user profile
    /// that references them before their rows are removed.
    async fn apply_firm_changes(&self, changes: &FirmChangeSet) -> StoreResult<()>;
}

/// Postgres-backed directory store.
#[derive(Debug, Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_record(firm: Firm, parent_code: Option<String>) -> StoreResult<FirmRecord> {
        let firm_type = firm
            .firm_type()
            .map_err(|e| StoreError::Decode(format!("firm {}: {e}", firm.code)))?;

        Ok(FirmRecord {
            id: firm.id,
            code: firm.code,
            name: firm.name,
            firm_type,
            enabled: firm.enabled,
            parent_code,
        })
    }
}

/// Row shape for firm queries that join in the parent's code.
#[derive(Debug, sqlx::FromRow)]
struct FirmWithParentRow {
    id: Uuid,
    code: String,
    name: String,
    firm_type: String,
    enabled: bool,
    parent_code: Option<String>,
}

impl FirmWithParentRow {
    fn into_record(self) -> StoreResult<FirmRecord> {
        let firm_type = self
            .firm_type
            .parse()
            .map_err(|e| StoreError::Decode(format!("firm {}: {e}", self.code)))?;

        Ok(FirmRecord {
            id: self.id,
            code: self.code,
            name: self.name,
            firm_type,
            enabled: self.enabled,
            parent_code: self.parent_code,
        })
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn find_firm_by_code(&self, code: &str) -> StoreResult<Option<FirmRecord>> {
        let row: Option<FirmWithParentRow> = sqlx::query_as(
            r"
            SELECT f.id, f.code, f.name, f.firm_type, f.enabled,
                   p.code AS parent_code
            FROM firms f
            LEFT JOIN firms p ON p.id = f.parent_firm_id
            WHERE f.code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FirmWithParentRow::into_record).transpose()
    }

    async fn list_enabled_firms(&self) -> StoreResult<Vec<FirmRecord>> {
        let rows: Vec<FirmWithParentRow> = sqlx::query_as(
            r"
            SELECT f.id, f.code, f.name, f.firm_type, f.enabled,
                   p.code AS parent_code
            FROM firms f
            LEFT JOIN firms p ON p.id = f.parent_firm_id
            WHERE f.enabled
            ORDER BY f.code
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(FirmWithParentRow::into_record)
            .collect()
    }

    async fn create_firm(&self, firm: &NewFirm) -> StoreResult<FirmRecord> {
        let created = Firm::create(&self.pool, firm).await?;
        Self::to_record(created, None)
    }

    async fn update_firm(&self, firm_id: Uuid, update: &FirmUpdate) -> StoreResult<()> {
        Firm::update_details(&self.pool, firm_id, update).await?;
        Ok(())
    }

    async fn disable_firm(&self, firm_id: Uuid) -> StoreResult<bool> {
        Ok(Firm::disable(&self.pool, firm_id).await?)
    }

    async fn offices_of_firm(&self, firm_id: Uuid) -> StoreResult<Vec<OfficeRecord>> {
        let offices = Office::list_by_firm(&self.pool, firm_id).await?;

        Ok(offices
            .into_iter()
            .map(|office| OfficeRecord {
                id: office.id,
                code: office.code.clone(),
                address: office.address(),
            })
            .collect())
    }

    async fn apply_firm_changes(&self, changes: &FirmChangeSet) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        match changes.parent {
            ParentLink::Unchanged => {}
            ParentLink::Set(parent_id) => {
                Firm::set_parent(&mut *tx, changes.firm_id, Some(parent_id)).await?;
            }
            ParentLink::Clear => {
                Firm::set_parent(&mut *tx, changes.firm_id, None).await?;
            }
        }

        for office_id in &changes.office_deletes {
            UserProfile::detach_office_from_all(&mut *tx, *office_id).await?;
            Office::delete(&mut *tx, *office_id).await?;
        }

        for write in &changes.office_creates {
            Office::create(
                &mut *tx,
                &NewOffice {
                    firm_id: changes.firm_id,
                    code: write.code.clone(),
                    address: write.address.clone(),
                },
            )
            .await?;
        }

        for update in &changes.office_updates {
            Office::update_address(&mut *tx, update.office_id, &update.address).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
