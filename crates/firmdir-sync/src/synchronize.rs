//! Synchronization engine.
//!
//! Applies a feed snapshot to the persisted directory: creates and updates
//! firms, resolves parent linkage, reconciles offices, and disables firms
//! that dropped out of the feed.
//!
//! Firms are handled in two passes so a firm may reference a parent that
//! appears later in the feed: pass 1 persists every firm without parent
//! linkage and builds a code-to-id map; pass 2 resolves parents through that
//! map and reconciles each firm's offices. Each firm-and-its-offices unit is
//! applied in its own transaction; a failure rolls back only that unit, and
//! the pass as a whole is safe to re-run.

use std::collections::HashMap;
use std::sync::Arc;

use firmdir_db::models::firm::{FirmUpdate, NewFirm};
use firmdir_feed::{FirmDescriptor, PdaSnapshot};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use crate::report::PdaSyncReport;
use crate::store::{
    DirectoryStore, FirmChangeSet, OfficeUpdate, OfficeWrite, ParentLink,
};

/// Applies feed snapshots to the directory.
pub struct SyncEngine<S> {
    store: Arc<S>,
}

/// Outcome of pass 1 for one firm.
struct FirmPassState {
    firm_id: Uuid,
    created: bool,
    updated: bool,
    previous_parent_code: Option<String>,
}

impl<S: DirectoryStore> SyncEngine<S> {
    /// Create an engine over a directory store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Synchronize the directory with a feed snapshot.
    ///
    /// Returns the counts of applied mutations. Running the same snapshot
    /// twice in a row yields an all-zero report on the second run.
    pub async fn synchronize_with_pda(&self, snapshot: &PdaSnapshot) -> SyncResult<PdaSyncReport> {
        let mut report = PdaSyncReport::default();

        let states = self.upsert_firms(snapshot, &mut report).await?;

        for descriptor in snapshot.firms() {
            self.reconcile_firm(descriptor, &states, &mut report).await?;
        }

        self.disable_missing_firms(snapshot, &mut report).await?;

        tracing::info!(
            firms_created = report.firms_created,
            firms_updated = report.firms_updated,
            firms_disabled = report.firms_disabled,
            offices_created = report.offices_created,
            offices_updated = report.offices_updated,
            offices_deleted = report.offices_deleted,
            "Synchronization pass applied"
        );

        Ok(report)
    }

    /// Pass 1: create or update every firm in the feed, without touching
    /// parent linkage, and record each firm's id for pass 2.
    async fn upsert_firms(
        &self,
        snapshot: &PdaSnapshot,
        report: &mut PdaSyncReport,
    ) -> SyncResult<HashMap<String, FirmPassState>> {
        let mut states = HashMap::new();

        for descriptor in snapshot.firms() {
            let state = match self.store.find_firm_by_code(&descriptor.code).await? {
                None => {
                    let created = self
                        .store
                        .create_firm(&NewFirm {
                            code: descriptor.code.clone(),
                            name: descriptor.name.clone(),
                            firm_type: descriptor.firm_type,
                        })
                        .await?;
                    report.firms_created += 1;
                    tracing::debug!(code = %descriptor.code, "Created firm");

                    FirmPassState {
                        firm_id: created.id,
                        created: true,
                        updated: false,
                        previous_parent_code: None,
                    }
                }
                Some(existing) => {
                    let needs_update = existing.name != descriptor.name
                        || existing.firm_type != descriptor.firm_type
                        || !existing.enabled;

                    if needs_update {
                        self.store
                            .update_firm(
                                existing.id,
                                &FirmUpdate {
                                    name: descriptor.name.clone(),
                                    firm_type: descriptor.firm_type,
                                    enabled: true,
                                },
                            )
                            .await?;
                        tracing::debug!(code = %descriptor.code, "Updated firm details");
                    }

                    FirmPassState {
                        firm_id: existing.id,
                        created: false,
                        updated: needs_update,
                        previous_parent_code: existing.parent_code,
                    }
                }
            };

            states.insert(descriptor.code.clone(), state);
        }

        Ok(states)
    }

    /// Pass 2: resolve the firm's parent link and reconcile its offices in a
    /// single transactional unit.
    async fn reconcile_firm(
        &self,
        descriptor: &FirmDescriptor,
        states: &HashMap<String, FirmPassState>,
        report: &mut PdaSyncReport,
    ) -> SyncResult<()> {
        let state = states
            .get(&descriptor.code)
            .ok_or_else(|| SyncError::Inconsistent(format!("firm {} missing", descriptor.code)))?;

        let parent = self.resolve_parent(descriptor, state, states)?;

        let stored = if state.created {
            Vec::new()
        } else {
            self.store.offices_of_firm(state.firm_id).await?
        };

        let mut office_creates = Vec::new();
        let mut office_updates = Vec::new();
        for office in &descriptor.offices {
            match stored.iter().find(|o| o.code == office.code) {
                None => office_creates.push(OfficeWrite {
                    code: office.code.clone(),
                    address: office.address.clone(),
                }),
                Some(existing) if existing.address != office.address => {
                    office_updates.push(OfficeUpdate {
                        office_id: existing.id,
                        address: office.address.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let office_deletes: Vec<Uuid> = stored
            .iter()
            .filter(|o| !descriptor.offices.iter().any(|d| d.code == o.code))
            .map(|o| o.id)
            .collect();

        let changes = FirmChangeSet {
            firm_id: state.firm_id,
            parent,
            office_creates,
            office_updates,
            office_deletes,
        };

        if !changes.is_noop() {
            self.store.apply_firm_changes(&changes).await?;
        }

        report.offices_created += changes.office_creates.len() as u32;
        report.offices_updated += changes.office_updates.len() as u32;
        report.offices_deleted += changes.office_deletes.len() as u32;

        let parent_changed = parent != ParentLink::Unchanged;
        if !state.created && (state.updated || parent_changed) {
            report.firms_updated += 1;
        }

        Ok(())
    }

    /// Work out whether the stored parent link has to change, resolving the
    /// feed's parent code through the pass-1 map.
    fn resolve_parent(
        &self,
        descriptor: &FirmDescriptor,
        state: &FirmPassState,
        states: &HashMap<String, FirmPassState>,
    ) -> SyncResult<ParentLink> {
        match (&descriptor.parent_code, &state.previous_parent_code) {
            (Some(code), previous) if previous.as_deref() != Some(code.as_str()) => {
                let parent = states.get(code).ok_or_else(|| {
                    SyncError::Inconsistent(format!(
                        "parent {code} of firm {} missing from pass 1",
                        descriptor.code
                    ))
                })?;
                Ok(ParentLink::Set(parent.firm_id))
            }
            (None, Some(_)) => Ok(ParentLink::Clear),
            _ => Ok(ParentLink::Unchanged),
        }
    }

    /// Disable pass: every enabled firm absent from the feed is soft-deleted.
    /// Its offices are left untouched.
    async fn disable_missing_firms(
        &self,
        snapshot: &PdaSnapshot,
        report: &mut PdaSyncReport,
    ) -> SyncResult<()> {
        for firm in self.store.list_enabled_firms().await? {
            if !snapshot.contains_firm(&firm.code) && self.store.disable_firm(firm.id).await? {
                report.firms_disabled += 1;
                tracing::debug!(code = %firm.code, "Disabled firm absent from feed");
            }
        }

        Ok(())
    }
}
