//! firmdir database layer.
//!
//! Relational storage for the provider directory: firms, their offices,
//! user-profile office associations, and the distributed lock table used to
//! coordinate scheduled synchronization across service instances.
//!
//! # Modules
//!
//! - [`pool`] - Connection pool construction
//! - [`migrations`] - Embedded SQL migration runner
//! - [`models`] - Row types and their CRUD operations
//! - [`error`] - Unified [`DbError`] type

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use models::{
    DistributedLock, Firm, FirmState, FirmType, FirmUpdate, NewFirm, NewOffice, Office,
    OfficeAddress, UserProfile,
};
pub use pool::DbPool;
