//! Row types and CRUD operations for the provider directory.

pub mod distributed_lock;
pub mod firm;
pub mod office;
pub mod user_profile;

pub use distributed_lock::DistributedLock;
pub use firm::{Firm, FirmState, FirmType, FirmUpdate, NewFirm};
pub use office::{NewOffice, Office, OfficeAddress};
pub use user_profile::UserProfile;
