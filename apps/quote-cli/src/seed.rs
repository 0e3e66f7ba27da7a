//! Admin settings seed files.
//!
//! ```toml
//! [[organizations]]
//! organization_id = "org-1"
//! forex_risk_pct = "3"
//! financial_agent_pct = "2"
//! daily_loan_pct = "0.069"
//! customs_logistics_pmt_due = 10
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use quote_settings::AdminSettingsRecord;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SettingsSeed {
    #[serde(default)]
    pub organizations: Vec<AdminSettingsRecord>,
}

impl SettingsSeed {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("settings seed is not valid TOML")
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_seed() {
        let seed = SettingsSeed::parse(
            r#"
            [[organizations]]
            organization_id = "org-1"
            forex_risk_pct = "3"
            financial_agent_pct = "2"
            daily_loan_pct = "0.069"
            customs_logistics_pmt_due = 10

            [[organizations]]
            organization_id = "org-2"
            forex_risk_pct = "0"
            financial_agent_pct = "1.5"
            daily_loan_pct = "0.05"
            customs_logistics_pmt_due = 0
            "#,
        )
        .unwrap();

        assert_eq!(seed.organizations.len(), 2);
        assert_eq!(seed.organizations[0].daily_loan_pct, dec!(0.069));
        assert_eq!(seed.organizations[1].financial_agent_pct, dec!(1.5));
        assert_eq!(seed.organizations[1].customs_logistics_pmt_due, 0);
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = SettingsSeed::parse(
            r#"
            [[organizations]]
            organization_id = "org-1"
            forex_risk_pct = "3"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_seed() {
        assert!(SettingsSeed::parse("").unwrap().organizations.is_empty());
    }
}
