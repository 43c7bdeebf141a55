//! PDA feed client for the firmdir provider directory.
//!
//! Fetches the authoritative provider-directory document from a local file or
//! a remote endpoint, parses it, and exposes an immutable [`PdaSnapshot`]
//! grouped by firm for the reconciliation engines.
//!
//! The feed is a JSON document with a single top-level `offices` array of
//! flat office records, each carrying its owning firm's details. Validation
//! happens at parse time; the engines never see a partially valid snapshot.

pub mod error;
pub mod record;
pub mod snapshot;
pub mod source;

pub use error::{FeedError, FeedResult};
pub use record::PdaFeedRecord;
pub use snapshot::{FirmDescriptor, OfficeDescriptor, PdaSnapshot};
pub use source::{FeedClient, FeedSource};
