//! Reconciliation pass reports.
//!
//! Value objects summarizing a single pass: per-operation counts plus, for
//! the read-only comparison, itemized lists of the entities that would
//! change. Produced fresh on every invocation and never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which entity family a change item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Firm,
    Office,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firm => write!(f, "firm"),
            Self::Office => write!(f, "office"),
        }
    }
}

/// One changed entity in a comparison report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItem {
    /// Entity family.
    #[serde(rename = "type")]
    pub entity: EntityKind,
    /// External code of the entity.
    pub code: String,
}

impl ChangeItem {
    #[must_use]
    pub fn firm(code: &str) -> Self {
        Self {
            entity: EntityKind::Firm,
            code: code.to_string(),
        }
    }

    #[must_use]
    pub fn office(code: &str) -> Self {
        Self {
            entity: EntityKind::Office,
            code: code.to_string(),
        }
    }
}

/// Read-only diff of a feed snapshot against the persisted directory.
///
/// Counts and buckets move together: every `record_*` call increments one
/// counter and pushes one item, so a count always equals the size of its
/// bucket partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub firm_creates: u32,
    pub firm_updates: u32,
    pub firm_disables: u32,
    pub office_creates: u32,
    pub office_updates: u32,
    pub office_deletes: u32,
    /// Entities the feed would create.
    pub created: Vec<ChangeItem>,
    /// Entities the feed would update.
    pub updated: Vec<ChangeItem>,
    /// Entities the feed would disable or delete.
    pub deleted: Vec<ChangeItem>,
}

impl ComparisonReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_firm_create(&mut self, code: &str) {
        self.firm_creates += 1;
        self.created.push(ChangeItem::firm(code));
    }

    pub fn record_firm_update(&mut self, code: &str) {
        self.firm_updates += 1;
        self.updated.push(ChangeItem::firm(code));
    }

    pub fn record_firm_disable(&mut self, code: &str) {
        self.firm_disables += 1;
        self.deleted.push(ChangeItem::firm(code));
    }

    pub fn record_office_create(&mut self, code: &str) {
        self.office_creates += 1;
        self.created.push(ChangeItem::office(code));
    }

    pub fn record_office_update(&mut self, code: &str) {
        self.office_updates += 1;
        self.updated.push(ChangeItem::office(code));
    }

    pub fn record_office_delete(&mut self, code: &str) {
        self.office_deletes += 1;
        self.deleted.push(ChangeItem::office(code));
    }

    /// Total number of changes across all categories.
    #[must_use]
    pub fn total_changes(&self) -> u32 {
        self.firm_creates
            + self.firm_updates
            + self.firm_disables
            + self.office_creates
            + self.office_updates
            + self.office_deletes
    }

    /// Whether the feed and the directory already agree.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0
    }
}

/// Counts of mutations applied by one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdaSyncReport {
    pub firms_created: u32,
    pub firms_updated: u32,
    pub firms_disabled: u32,
    pub offices_created: u32,
    pub offices_updated: u32,
    pub offices_deleted: u32,
}

impl PdaSyncReport {
    /// Total number of mutations applied.
    #[must_use]
    pub fn total_changes(&self) -> u32 {
        self.firms_created
            + self.firms_updated
            + self.firms_disabled
            + self.offices_created
            + self.offices_updated
            + self.offices_deleted
    }

    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0
    }
}
