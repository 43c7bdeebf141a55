//! Immutable, validated snapshot of the PDA feed.
//!
//! Groups the flat office records by firm code and checks the invariants the
//! reconciliation engines rely on, so a snapshot that reaches an engine is
//! always internally consistent.

use std::collections::{HashMap, HashSet};

use firmdir_db::{FirmType, OfficeAddress};

use crate::error::{FeedError, FeedResult};
use crate::record::PdaFeedRecord;

/// One office listed for a firm in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeDescriptor {
    /// Office account code, unique within the firm.
    pub code: String,
    /// Address as delivered by the feed.
    pub address: OfficeAddress,
}

/// One distinct firm in the feed, with its offices.
#[derive(Debug, Clone)]
pub struct FirmDescriptor {
    /// External firm code.
    pub code: String,
    /// Firm display name.
    pub name: String,
    /// Firm category.
    pub firm_type: FirmType,
    /// Code of the parent firm, if any. Always present in the same snapshot.
    pub parent_code: Option<String>,
    /// Offices listed for this firm, in feed order.
    pub offices: Vec<OfficeDescriptor>,
}

/// A parsed, validated feed document at a point in time.
///
/// Firms appear in first-seen feed order, which lets a firm reference a
/// parent that only appears later in the document.
#[derive(Debug, Clone)]
pub struct PdaSnapshot {
    firms: Vec<FirmDescriptor>,
}

impl PdaSnapshot {
    /// Parse and validate a feed document (`{ "offices": [...] }`).
    pub fn from_json(json: &str) -> FeedResult<Self> {
        let document: PdaDocument = serde_json::from_str(json)?;
        Self::from_records(document.offices)
    }

    /// Group raw records by firm code and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Validation` when a record has an empty firm code,
    /// an unknown firm type, conflicting firm details across records of the
    /// same firm, a duplicate office code, a parent code not present in the
    /// feed, or a cyclic parent chain.
    pub fn from_records(records: Vec<PdaFeedRecord>) -> FeedResult<Self> {
        let mut firms: Vec<FirmDescriptor> = Vec::new();
        let mut index_by_code: HashMap<String, usize> = HashMap::new();

        for record in records {
            let code = record.firm_number.trim();
            if code.is_empty() {
                return Err(FeedError::Validation(
                    "record with empty firmNumber".to_string(),
                ));
            }

            let firm_type: FirmType = record
                .firm_type
                .parse()
                .map_err(|e| FeedError::Validation(format!("firm {code}: {e}")))?;
            let parent_code = normalize(record.parent_firm_number.as_deref());

            let index = match index_by_code.get(code) {
                Some(&index) => {
                    let existing = &firms[index];
                    if existing.name != record.firm_name
                        || existing.firm_type != firm_type
                        || existing.parent_code != parent_code
                    {
                        return Err(FeedError::Validation(format!(
                            "firm {code} listed with conflicting details"
                        )));
                    }
                    index
                }
                None => {
                    firms.push(FirmDescriptor {
                        code: code.to_string(),
                        name: record.firm_name.clone(),
                        firm_type,
                        parent_code,
                        offices: Vec::new(),
                    });
                    index_by_code.insert(code.to_string(), firms.len() - 1);
                    firms.len() - 1
                }
            };

            if let Some(office_code) = normalize(record.office_account_number.as_deref()) {
                let firm = &mut firms[index];
                if firm.offices.iter().any(|o| o.code == office_code) {
                    return Err(FeedError::Validation(format!(
                        "firm {code} lists office {office_code} more than once"
                    )));
                }
                firm.offices.push(OfficeDescriptor {
                    code: office_code,
                    address: OfficeAddress {
                        line1: record.office_address_line1,
                        line2: record.office_address_line2,
                        line3: record.office_address_line3,
                        city: record.office_address_city,
                        postcode: record.office_address_postcode,
                    },
                });
            }
        }

        validate_parents(&firms, &index_by_code)?;

        Ok(Self { firms })
    }

    /// Firms in first-seen feed order.
    #[must_use]
    pub fn firms(&self) -> &[FirmDescriptor] {
        &self.firms
    }

    /// Whether a firm code appears in the feed.
    #[must_use]
    pub fn contains_firm(&self, code: &str) -> bool {
        self.firms.iter().any(|f| f.code == code)
    }

    /// Number of distinct firms.
    #[must_use]
    pub fn firm_count(&self) -> usize {
        self.firms.len()
    }

    /// Whether the feed lists no firms at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.firms.is_empty()
    }
}

/// Every parent code must resolve within the feed, and parent chains must be
/// acyclic; a violation rejects the whole document.
fn validate_parents(
    firms: &[FirmDescriptor],
    index_by_code: &HashMap<String, usize>,
) -> FeedResult<()> {
    for firm in firms {
        let Some(parent_code) = &firm.parent_code else {
            continue;
        };

        if !index_by_code.contains_key(parent_code.as_str()) {
            return Err(FeedError::Validation(format!(
                "firm {} references parent {parent_code} not present in the feed",
                firm.code
            )));
        }

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(firm.code.as_str());
        let mut current = parent_code.as_str();
        loop {
            if !visited.insert(current) {
                return Err(FeedError::Validation(format!(
                    "cyclic parent chain involving firm {current}"
                )));
            }
            let index = index_by_code[current];
            match &firms[index].parent_code {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }
    }

    Ok(())
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, serde::Deserialize)]
struct PdaDocument {
    offices: Vec<PdaFeedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(firm: &str, office: Option<&str>) -> PdaFeedRecord {
        PdaFeedRecord {
            firm_number: firm.to_string(),
            firm_name: format!("{firm} Ltd"),
            firm_type: "broker".to_string(),
            parent_firm_number: None,
            office_account_number: office.map(str::to_string),
            office_address_line1: Some("1 High Street".to_string()),
            office_address_line2: None,
            office_address_line3: None,
            office_address_city: None,
            office_address_postcode: None,
        }
    }

    #[test]
    fn test_groups_offices_under_firm() {
        let snapshot = PdaSnapshot::from_records(vec![
            record("F001", Some("O001")),
            record("F001", Some("O002")),
            record("F002", Some("O001")),
        ])
        .unwrap();

        assert_eq!(snapshot.firm_count(), 2);
        assert_eq!(snapshot.firms()[0].code, "F001");
        assert_eq!(snapshot.firms()[0].offices.len(), 2);
        assert_eq!(snapshot.firms()[1].code, "F002");
        assert_eq!(snapshot.firms()[1].offices.len(), 1);
    }

    #[test]
    fn test_preserves_first_seen_order() {
        let snapshot = PdaSnapshot::from_records(vec![
            record("F003", Some("O001")),
            record("F001", Some("O001")),
            record("F003", Some("O002")),
            record("F002", None),
        ])
        .unwrap();

        let codes: Vec<&str> = snapshot.firms().iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["F003", "F001", "F002"]);
    }

    #[test]
    fn test_firm_without_offices() {
        let snapshot = PdaSnapshot::from_records(vec![record("F001", None)]).unwrap();

        assert_eq!(snapshot.firm_count(), 1);
        assert!(snapshot.firms()[0].offices.is_empty());
    }

    #[test]
    fn test_rejects_unknown_firm_type() {
        let mut bad = record("F001", Some("O001"));
        bad.firm_type = "franchise".to_string();

        let err = PdaSnapshot::from_records(vec![bad]).unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(err.to_string().contains("F001"));
    }

    #[test]
    fn test_rejects_duplicate_office() {
        let err = PdaSnapshot::from_records(vec![
            record("F001", Some("O001")),
            record("F001", Some("O001")),
        ])
        .unwrap_err();

        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_conflicting_firm_details() {
        let mut renamed = record("F001", Some("O002"));
        renamed.firm_name = "Different Name".to_string();

        let err =
            PdaSnapshot::from_records(vec![record("F001", Some("O001")), renamed]).unwrap_err();
        assert!(err.to_string().contains("conflicting details"));
    }

    #[test]
    fn test_rejects_missing_parent() {
        let mut child = record("F001", None);
        child.parent_firm_number = Some("F999".to_string());

        let err = PdaSnapshot::from_records(vec![child]).unwrap_err();
        assert!(err.to_string().contains("not present in the feed"));
    }

    #[test]
    fn test_rejects_parent_cycle() {
        let mut a = record("F001", None);
        a.parent_firm_number = Some("F002".to_string());
        let mut b = record("F002", None);
        b.parent_firm_number = Some("F001".to_string());

        let err = PdaSnapshot::from_records(vec![a, b]).unwrap_err();
        assert!(err.to_string().contains("cyclic parent chain"));
    }

    #[test]
    fn test_rejects_self_parent() {
        let mut a = record("F001", None);
        a.parent_firm_number = Some("F001".to_string());

        let err = PdaSnapshot::from_records(vec![a]).unwrap_err();
        assert!(err.to_string().contains("cyclic parent chain"));
    }

    #[test]
    fn test_forward_parent_reference_is_valid() {
        let mut child = record("F001", None);
        child.parent_firm_number = Some("F002".to_string());

        let snapshot = PdaSnapshot::from_records(vec![child, record("F002", None)]).unwrap();
        assert_eq!(snapshot.firms()[0].parent_code.as_deref(), Some("F002"));
    }

    #[test]
    fn test_from_json_document() {
        let json = r#"{
            "offices": [
                {
                    "firmNumber": "F001",
                    "firmName": "Acme Brokers",
                    "firmType": "broker",
                    "officeAccountNumber": "O001",
                    "officeAddressCity": "Leeds"
                }
            ]
        }"#;

        let snapshot = PdaSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.firm_count(), 1);
        assert_eq!(
            snapshot.firms()[0].offices[0].address.city.as_deref(),
            Some("Leeds")
        );
    }

    #[test]
    fn test_empty_document() {
        let snapshot = PdaSnapshot::from_json(r#"{ "offices": [] }"#).unwrap();
        assert!(snapshot.is_empty());
    }
}
