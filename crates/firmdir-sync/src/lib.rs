//! # firmdir reconciliation
//!
//! Keeps the local provider directory consistent with the authoritative PDA
//! feed. A fleet of identical service instances shares one periodic job;
//! the distributed lock ensures a single instance runs it per cycle.
//!
//! ```text
//! ┌──────────────┐      ┌───────────────────┐      ┌─────────────────┐
//! │  PDA Feed    │─────►│  Comparison /     │◄────►│  Directory      │
//! │ (file/HTTP)  │      │  Sync Engine      │      │  Store          │
//! └──────────────┘      └─────────┬─────────┘      └─────────────────┘
//!                                 │
//!                       ┌─────────▼─────────┐
//!                       │  Distributed Lock │
//!                       │  (one row/lease)  │
//!                       └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`compare`] - Read-only diff of a feed snapshot against the directory
//! - [`synchronize`] - Applies a snapshot: two-pass firm/parent resolution,
//!   office reconciliation, firm disabling
//! - [`lock`] - Time-boxed named leases over a conditional-write store
//! - [`worker`] - Periodic lock-guarded invocation loop
//! - [`store`] - The [`DirectoryStore`] seam and its Postgres implementation
//! - [`report`] - Per-pass result objects

pub mod compare;
pub mod error;
pub mod lock;
pub mod report;
pub mod store;
pub mod synchronize;
pub mod worker;

pub use compare::ComparisonEngine;
pub use error::{SyncError, SyncResult};
pub use lock::{LeaseStore, LockError, LockService, PgLeaseStore};
pub use report::{ChangeItem, ComparisonReport, EntityKind, PdaSyncReport};
pub use store::{
    DirectoryStore, FirmChangeSet, FirmRecord, OfficeRecord, OfficeUpdate, OfficeWrite,
    ParentLink, PgDirectoryStore, StoreError, StoreResult,
};
pub use synchronize::SyncEngine;
pub use worker::{SyncWorker, SyncWorkerConfig, WorkerMode};
