//! Office model.
//!
//! An office is a physical location belonging to exactly one firm, keyed by a
//! code unique within that firm. Unlike firms, offices are hard-deleted when
//! they drop out of the feed for a still-enabled firm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Postal address of an office. Every field is optional in the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
}

/// An office row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Office {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning firm.
    pub firm_id: Uuid,
    /// Office account code, unique within the firm.
    pub code: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub address_city: Option<String>,
    pub address_postcode: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Office {
    /// The office address as a value object.
    #[must_use]
    pub fn address(&self) -> OfficeAddress {
        OfficeAddress {
            line1: self.address_line1.clone(),
            line2: self.address_line2.clone(),
            line3: self.address_line3.clone(),
            city: self.address_city.clone(),
            postcode: self.address_postcode.clone(),
        }
    }

    /// Insert a new office for a firm.
    pub async fn create<'e, E>(executor: E, input: &NewOffice) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO offices (firm_id, code, address_line1, address_line2,
                                 address_line3, address_city, address_postcode)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, firm_id, code, address_line1, address_line2,
                      address_line3, address_city, address_postcode,
                      created_at, updated_at
            ",
        )
        .bind(input.firm_id)
        .bind(&input.code)
        .bind(&input.address.line1)
        .bind(&input.address.line2)
        .bind(&input.address.line3)
        .bind(&input.address.city)
        .bind(&input.address.postcode)
        .fetch_one(executor)
        .await
    }

    /// Replace the address fields of an office.
    pub async fn update_address<'e, E>(
        executor: E,
        id: Uuid,
        address: &OfficeAddress,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE offices
            SET address_line1 = $2, address_line2 = $3, address_line3 = $4,
                address_city = $5, address_postcode = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.line3)
        .bind(&address.city)
        .bind(&address.postcode)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Hard-delete an office. Profile associations must be detached first.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM offices WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// List all offices of a firm.
    pub async fn list_by_firm<'e, E>(executor: E, firm_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT id, firm_id, code, address_line1, address_line2,
                   address_line3, address_city, address_postcode,
                   created_at, updated_at
            FROM offices
            WHERE firm_id = $1
            ORDER BY code
            ",
        )
        .bind(firm_id)
        .fetch_all(executor)
        .await
    }
}

/// Input for creating an office.
#[derive(Debug, Clone)]
pub struct NewOffice {
    pub firm_id: Uuid,
    pub code: String,
    pub address: OfficeAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip() {
        let office = Office {
            id: Uuid::new_v4(),
            firm_id: Uuid::new_v4(),
            code: "O001".to_string(),
            address_line1: Some("1 High Street".to_string()),
            address_line2: None,
            address_line3: None,
            address_city: Some("Leeds".to_string()),
            address_postcode: Some("LS1 1AA".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let address = office.address();
        assert_eq!(address.line1.as_deref(), Some("1 High Street"));
        assert_eq!(address.city.as_deref(), Some("Leeds"));
        assert!(address.line2.is_none());
    }

    #[test]
    fn test_address_equality() {
        let a = OfficeAddress {
            line1: Some("1 High Street".to_string()),
            ..OfficeAddress::default()
        };
        let b = OfficeAddress {
            line1: Some("1 High Street".to_string()),
            ..OfficeAddress::default()
        };
        let c = OfficeAddress {
            line1: Some("2 High Street".to_string()),
            ..OfficeAddress::default()
        };

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
