//! Comparison engine.
//!
//! Computes a read-only diff of a feed snapshot against the persisted
//! directory. Never mutates the store: running it twice over the same inputs
//! yields identical reports.

use std::collections::HashMap;
use std::sync::Arc;

use firmdir_feed::{FirmDescriptor, PdaSnapshot};

use crate::error::SyncResult;
use crate::report::ComparisonReport;
use crate::store::{DirectoryStore, FirmRecord, OfficeRecord};

/// Read-only diff of feed against directory.
pub struct ComparisonEngine<S> {
    store: Arc<S>,
}

impl<S: DirectoryStore> ComparisonEngine<S> {
    /// Create an engine over a directory store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Diff the snapshot against the persisted directory.
    ///
    /// Classification per firm in the feed: absent from the store is a
    /// create (along with every office it lists); present with differing
    /// name, type or parent code is an update; otherwise unchanged. Offices
    /// of firms present on both sides are diffed by code. Enabled firms
    /// absent from the feed are disable items.
    pub async fn compare_with_database(
        &self,
        snapshot: &PdaSnapshot,
    ) -> SyncResult<ComparisonReport> {
        let mut report = ComparisonReport::new();

        for descriptor in snapshot.firms() {
            match self.store.find_firm_by_code(&descriptor.code).await? {
                None => {
                    report.record_firm_create(&descriptor.code);
                    for office in &descriptor.offices {
                        report.record_office_create(&office.code);
                    }
                }
                Some(firm) => {
                    if firm_differs(&firm, descriptor) {
                        report.record_firm_update(&descriptor.code);
                    }
                    self.compare_offices(&firm, descriptor, &mut report).await?;
                }
            }
        }

        for firm in self.store.list_enabled_firms().await? {
            if !snapshot.contains_firm(&firm.code) {
                report.record_firm_disable(&firm.code);
            }
        }

        tracing::debug!(
            changes = report.total_changes(),
            firms = snapshot.firm_count(),
            "Compared feed snapshot against directory"
        );

        Ok(report)
    }

    /// Diff one firm's offices by code.
    async fn compare_offices(
        &self,
        firm: &FirmRecord,
        descriptor: &FirmDescriptor,
        report: &mut ComparisonReport,
    ) -> SyncResult<()> {
        let stored = self.store.offices_of_firm(firm.id).await?;
        let stored_by_code: HashMap<&str, &OfficeRecord> =
            stored.iter().map(|o| (o.code.as_str(), o)).collect();

        for office in &descriptor.offices {
            match stored_by_code.get(office.code.as_str()) {
                None => report.record_office_create(&office.code),
                Some(existing) if existing.address != office.address => {
                    report.record_office_update(&office.code);
                }
                Some(_) => {}
            }
        }

        for office in &stored {
            if !descriptor.offices.iter().any(|o| o.code == office.code) {
                report.record_office_delete(&office.code);
            }
        }

        Ok(())
    }
}

/// A firm needs an update when its name, type or parent linkage differs from
/// the feed descriptor.
fn firm_differs(firm: &FirmRecord, descriptor: &FirmDescriptor) -> bool {
    firm.name != descriptor.name
        || firm.firm_type != descriptor.firm_type
        || firm.parent_code != descriptor.parent_code
}

#[cfg(test)]
mod tests {
    use super::*;
    use firmdir_db::FirmType;
    use uuid::Uuid;

    fn firm_record(name: &str, parent_code: Option<&str>) -> FirmRecord {
        FirmRecord {
            id: Uuid::new_v4(),
            code: "F001".to_string(),
            name: name.to_string(),
            firm_type: FirmType::Broker,
            enabled: true,
            parent_code: parent_code.map(str::to_string),
        }
    }

    fn descriptor(name: &str, parent_code: Option<&str>) -> FirmDescriptor {
        FirmDescriptor {
            code: "F001".to_string(),
            name: name.to_string(),
            firm_type: FirmType::Broker,
            parent_code: parent_code.map(str::to_string),
            offices: vec![],
        }
    }

    #[test]
    fn test_identical_firm_is_unchanged() {
        assert!(!firm_differs(
            &firm_record("Acme", None),
            &descriptor("Acme", None)
        ));
    }

    #[test]
    fn test_name_change_is_an_update() {
        assert!(firm_differs(
            &firm_record("Old Firm Name", None),
            &descriptor("Updated Firm Name", None)
        ));
    }

    #[test]
    fn test_parent_change_alone_is_an_update() {
        assert!(firm_differs(
            &firm_record("Acme", None),
            &descriptor("Acme", Some("F002"))
        ));
        assert!(firm_differs(
            &firm_record("Acme", Some("F002")),
            &descriptor("Acme", None)
        ));
    }

    #[test]
    fn test_type_change_is_an_update() {
        let stored = FirmRecord {
            firm_type: FirmType::Principal,
            ..firm_record("Acme", None)
        };
        assert!(firm_differs(&stored, &descriptor("Acme", None)));
    }
}
