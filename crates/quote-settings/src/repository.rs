//! # Admin Settings Repository
//!
//! Reads and writes the `admin_settings` table.
//!
//! Percentages are stored as administrators type them (`3` for 3%) and
//! converted to fractions on the way out, so the engine only ever sees
//! fractions.

use chrono::Utc;
use quote_core::types::AdminSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// One organization's settings in administrator units (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSettingsRecord {
    pub organization_id: String,
    pub forex_risk_pct: Decimal,
    pub financial_agent_pct: Decimal,
    pub daily_loan_pct: Decimal,
    pub customs_logistics_pmt_due: u32,
}

impl AdminSettingsRecord {
    /// Converts percent to the fractions the engine works in.
    pub fn to_settings(&self) -> AdminSettings {
        AdminSettings::from_percent(
            self.forex_risk_pct,
            self.financial_agent_pct,
            self.daily_loan_pct,
            self.customs_logistics_pmt_due,
        )
    }

    fn validate(&self) -> SettingsResult<()> {
        if self.organization_id.trim().is_empty() {
            return Err(SettingsError::invalid("organization_id", &self.organization_id));
        }
        let hundred = Decimal::ONE_HUNDRED;
        for (field, pct) in [
            ("forex_risk_pct", self.forex_risk_pct),
            ("financial_agent_pct", self.financial_agent_pct),
            ("daily_loan_pct", self.daily_loan_pct),
        ] {
            if pct < Decimal::ZERO || pct > hundred {
                return Err(SettingsError::invalid(field, pct));
            }
        }
        Ok(())
    }
}

/// Raw row; decimals come back as TEXT.
#[derive(Debug, sqlx::FromRow)]
struct AdminSettingsRow {
    organization_id: String,
    forex_risk_pct: String,
    financial_agent_pct: String,
    daily_loan_pct: String,
    customs_logistics_pmt_due: i64,
}

impl TryFrom<AdminSettingsRow> for AdminSettingsRecord {
    type Error = SettingsError;

    fn try_from(row: AdminSettingsRow) -> SettingsResult<Self> {
        Ok(AdminSettingsRecord {
            forex_risk_pct: parse_pct("forex_risk_pct", &row.forex_risk_pct)?,
            financial_agent_pct: parse_pct("financial_agent_pct", &row.financial_agent_pct)?,
            daily_loan_pct: parse_pct("daily_loan_pct", &row.daily_loan_pct)?,
            customs_logistics_pmt_due: u32::try_from(row.customs_logistics_pmt_due).map_err(|_| {
                SettingsError::invalid("customs_logistics_pmt_due", row.customs_logistics_pmt_due)
            })?,
            organization_id: row.organization_id,
        })
    }
}

fn parse_pct(field: &str, text: &str) -> SettingsResult<Decimal> {
    text.trim()
        .parse::<Decimal>()
        .map_err(|_| SettingsError::invalid(field, text))
}

/// Repository for admin settings.
#[derive(Debug, Clone)]
pub struct AdminSettingsRepository {
    pool: SqlitePool,
}

impl AdminSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdminSettingsRepository { pool }
    }

    /// Settings for one organization, as fractions.
    ///
    /// ## Errors
    /// - `NotFound` when no row exists
    /// - `InvalidValue` when a stored value is not a usable rate
    pub async fn get(&self, organization_id: &str) -> SettingsResult<AdminSettings> {
        let record = self.get_record(organization_id).await?;
        record.validate()?;
        Ok(record.to_settings())
    }

    /// Settings for one organization, as stored.
    pub async fn get_record(&self, organization_id: &str) -> SettingsResult<AdminSettingsRecord> {
        debug!(organization = %organization_id, "Fetching admin settings");

        let row = sqlx::query_as::<_, AdminSettingsRow>(
            r#"
            SELECT
                organization_id,
                forex_risk_pct,
                financial_agent_pct,
                daily_loan_pct,
                customs_logistics_pmt_due
            FROM admin_settings
            WHERE organization_id = ?1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| SettingsError::not_found(organization_id))?;

        AdminSettingsRecord::try_from(row)
    }

    /// Inserts or replaces an organization's settings.
    pub async fn upsert(&self, record: &AdminSettingsRecord) -> SettingsResult<()> {
        record.validate()?;
        debug!(organization = %record.organization_id, "Upserting admin settings");

        sqlx::query(
            r#"
            INSERT INTO admin_settings (
                organization_id,
                forex_risk_pct,
                financial_agent_pct,
                daily_loan_pct,
                customs_logistics_pmt_due,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(organization_id) DO UPDATE SET
                forex_risk_pct = excluded.forex_risk_pct,
                financial_agent_pct = excluded.financial_agent_pct,
                daily_loan_pct = excluded.daily_loan_pct,
                customs_logistics_pmt_due = excluded.customs_logistics_pmt_due,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.organization_id)
        .bind(record.forex_risk_pct.to_string())
        .bind(record.financial_agent_pct.to_string())
        .bind(record.daily_loan_pct.to_string())
        .bind(i64::from(record.customs_logistics_pmt_due))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every stored organization, ordered by id.
    pub async fn list(&self) -> SettingsResult<Vec<AdminSettingsRecord>> {
        let rows = sqlx::query_as::<_, AdminSettingsRow>(
            r#"
            SELECT
                organization_id,
                forex_risk_pct,
                financial_agent_pct,
                daily_loan_pct,
                customs_logistics_pmt_due
            FROM admin_settings
            ORDER BY organization_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed admin settings");
        rows.into_iter().map(AdminSettingsRecord::try_from).collect()
    }

    /// Removes an organization's settings. Returns whether a row existed.
    pub async fn delete(&self, organization_id: &str) -> SettingsResult<bool> {
        let result = sqlx::query("DELETE FROM admin_settings WHERE organization_id = ?1")
            .bind(organization_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{SettingsDb, SettingsDbConfig};
    use rust_decimal_macros::dec;

    fn record(org: &str) -> AdminSettingsRecord {
        AdminSettingsRecord {
            organization_id: org.into(),
            forex_risk_pct: dec!(3),
            financial_agent_pct: dec!(2),
            daily_loan_pct: dec!(0.069),
            customs_logistics_pmt_due: 10,
        }
    }

    async fn repo() -> (SettingsDb, AdminSettingsRepository) {
        let db = SettingsDb::new(SettingsDbConfig::in_memory()).await.unwrap();
        let repo = db.admin_settings_repo();
        (db, repo)
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let (_db, repo) = repo().await;
        repo.upsert(&record("org-1")).await.unwrap();

        let updated = AdminSettingsRecord {
            forex_risk_pct: dec!(4.5),
            ..record("org-1")
        };
        repo.upsert(&updated).await.unwrap();

        assert_eq!(repo.get_record("org-1").await.unwrap(), updated);
        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert_eq!(repo.get("org-1").await.unwrap().forex_risk_rate, dec!(0.045));
    }

    #[tokio::test]
    async fn test_percent_above_hundred_rejected() {
        let (_db, repo) = repo().await;
        let bad = AdminSettingsRecord {
            daily_loan_pct: dec!(150),
            ..record("org-1")
        };
        let err = repo.upsert(&bad).await.unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_stored_value_is_invalid() {
        let (db, repo) = repo().await;
        sqlx::query(
            "INSERT INTO admin_settings VALUES ('org-x', 'three', '2', '0.069', 10, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo.get("org-x").await.unwrap_err();
        match err {
            SettingsError::InvalidValue { field, value } => {
                assert_eq!(field, "forex_risk_pct");
                assert_eq!(value, "three");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (_db, repo) = repo().await;
        repo.upsert(&record("org-b")).await.unwrap();
        repo.upsert(&record("org-a")).await.unwrap();

        let ids: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.organization_id)
            .collect();
        assert_eq!(ids, vec!["org-a", "org-b"]);

        assert!(repo.delete("org-a").await.unwrap());
        assert!(!repo.delete("org-a").await.unwrap());
        assert!(matches!(
            repo.get("org-a").await.unwrap_err(),
            SettingsError::NotFound { .. }
        ));
    }
}
