//! Wire format of a single PDA feed record.

use serde::{Deserialize, Serialize};

/// One element of the feed's `offices` array.
///
/// The feed is office-centric: each record carries its owning firm's details
/// alongside the office fields. A record with no `officeAccountNumber` lists
/// the firm alone, so a firm with zero offices still appears in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdaFeedRecord {
    /// External firm code; the natural key for reconciliation.
    pub firm_number: String,
    /// Firm display name.
    pub firm_name: String,
    /// Firm category as an enumerated string.
    pub firm_type: String,
    /// Code of the parent firm, if any.
    #[serde(default)]
    pub parent_firm_number: Option<String>,
    /// Office account code, unique within the firm.
    #[serde(default)]
    pub office_account_number: Option<String>,
    #[serde(default)]
    pub office_address_line1: Option<String>,
    #[serde(default)]
    pub office_address_line2: Option<String>,
    #[serde(default)]
    pub office_address_line3: Option<String>,
    #[serde(default)]
    pub office_address_city: Option<String>,
    #[serde(default)]
    pub office_address_postcode: Option<String>,
}
