//! # Domain Types
//!
//! Wire-level request types, categorical enumerations and admin settings.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  QuoteRequest   │   │  QuoteDefaults  │   │  ProductInput   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  customer_id    │──►│  currency, ...  │   │  quantity       │       │
//! │  │  quote_defaults │   │  logistics legs │   │  base_price     │       │
//! │  │  items[]        │──►│  payment terms  │   │  overrides (o)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Incoterms     │   │    SaleType     │   │  SellerCountry  │       │
//! │  │  DDP, FOB, ...  │   │  supply, export │   │  russia, turkey │       │
//! │  └─────────────────┘   │  transit        │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐                                                    │
//! │  │  AdminSettings  │  fetched per organization, read-only              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Percent Convention
//! Every rate is a FRACTION: `0.20` means 20%. Categorical fields arrive as
//! plain strings and are parsed by the normalizer so that an unknown value is
//! reported as a `ValidationError` naming the field, not as a serde failure.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationIssue};

// =============================================================================
// Categorical Enumerations
// =============================================================================

/// Declares a closed, string-parsed enumeration.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $variant:ident => $text:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted spelling, in declaration order.
            pub const ALLOWED: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationIssue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( t if t.eq_ignore_ascii_case($text) => Ok($name::$variant), )+
                    _ => Err(ValidationIssue::NotAllowed {
                        allowed: Self::ALLOWED.iter().map(|s| s.to_string()).collect(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Currencies a quote or a supplier price can be expressed in.
    Currency {
        Usd => "USD",
        Eur => "EUR",
        Rub => "RUB",
        Cny => "CNY",
        Try => "TRY",
    }
}

impl Currency {
    /// Decimal places of the currency's minor unit.
    pub const fn minor_units(&self) -> u32 {
        match self {
            Currency::Usd | Currency::Eur | Currency::Rub | Currency::Cny | Currency::Try => 2,
        }
    }
}

string_enum! {
    /// Delivery terms (Incoterms 2020 subset used by the sales team).
    Incoterms {
        Ddp => "DDP",
        Dap => "DAP",
        Cif => "CIF",
        Cpt => "CPT",
        Fca => "FCA",
        Fob => "FOB",
        Exw => "EXW",
    }
}

string_enum! {
    /// Commercial nature of the deal.
    SaleType {
        Supply => "supply",
        Export => "export",
        Transit => "transit",
    }
}

string_enum! {
    /// Jurisdiction of the selling legal entity.
    SellerCountry {
        Russia => "russia",
        Turkey => "turkey",
    }
}

// =============================================================================
// Decision-Maker Fee
// =============================================================================

/// Decision-maker fee: a flat quote-level amount or a share of base COGS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DmFee {
    /// Flat amount in the quote currency, distributed across products.
    Fixed(Decimal),
    /// Fraction of each product's base COGS.
    Percent(Decimal),
}

impl Default for DmFee {
    fn default() -> Self {
        DmFee::Fixed(Decimal::ZERO)
    }
}

// =============================================================================
// Admin Settings
// =============================================================================

/// Organization-wide rates, fetched once per calculation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Forex-risk reserve (fraction of pre-tax sale price).
    pub forex_risk_rate: Decimal,

    /// Financial-agent commission (fraction of the financed amount).
    pub financial_agent_rate: Decimal,

    /// Daily loan interest rate (fraction per day, compounded daily).
    pub daily_loan_rate: Decimal,

    /// Days before delivery by which customs and logistics must be paid.
    pub customs_logistics_pmt_due: u32,
}

impl AdminSettings {
    /// Builds settings from percentages as administrators enter them.
    ///
    /// ## Example
    /// ```rust
    /// use quote_core::types::AdminSettings;
    /// use rust_decimal_macros::dec;
    ///
    /// let settings = AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10);
    /// assert_eq!(settings.forex_risk_rate, dec!(0.03));
    /// assert_eq!(settings.daily_loan_rate, dec!(0.00069));
    /// ```
    pub fn from_percent(
        forex_risk_pct: Decimal,
        financial_agent_pct: Decimal,
        daily_loan_pct: Decimal,
        customs_logistics_pmt_due: u32,
    ) -> Self {
        let hundred = dec!(100);
        AdminSettings {
            forex_risk_rate: forex_risk_pct / hundred,
            financial_agent_rate: financial_agent_pct / hundred,
            daily_loan_rate: daily_loan_pct / hundred,
            customs_logistics_pmt_due,
        }
    }

    /// Checks that every rate is a fraction in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let rates = [
            ("admin.forex_risk_rate", self.forex_risk_rate),
            ("admin.financial_agent_rate", self.financial_agent_rate),
            ("admin.daily_loan_rate", self.daily_loan_rate),
        ];
        for (field, rate) in rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ValidationError::quote(
                    field,
                    ValidationIssue::OutOfRange {
                        min: "0".to_string(),
                        max: "1".to_string(),
                    },
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Request Payload
// =============================================================================

/// Calculation request as received from the CRUD/UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub customer_id: String,

    /// Day 0 of the payment schedule; only used to date the milestones.
    #[serde(default)]
    pub quote_date: Option<NaiveDate>,

    pub quote_defaults: QuoteDefaults,

    pub items: Vec<ProductInput>,
}

/// Quote-wide variables. Immutable once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDefaults {
    pub currency_of_quote: String,
    pub seller_company: String,
    pub seller_country: String,
    pub incoterms: String,
    pub sale_type: String,

    // Overridable per product.
    pub currency_of_base_price: String,
    #[serde(default = "one")]
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub supplier_discount: Decimal,
    pub markup: Decimal,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,

    #[serde(default)]
    pub dm_fee: DmFee,

    // Payment schedule.
    #[serde(default)]
    pub advance_from_client: Decimal,
    #[serde(default)]
    pub advance_to_supplier: Decimal,
    #[serde(default)]
    pub time_to_advance: u32,
    #[serde(default)]
    pub delivery_time: u32,
    #[serde(default)]
    pub time_to_advance_on_receiving: u32,

    // Logistics legs (quote currency).
    #[serde(default)]
    pub logistics_supplier_hub: Decimal,
    #[serde(default)]
    pub logistics_hub_customs: Decimal,
    #[serde(default)]
    pub logistics_customs_client: Decimal,

    // Customs and brokerage constants (quote currency).
    #[serde(default)]
    pub brokerage_hub: Decimal,
    #[serde(default)]
    pub brokerage_customs: Decimal,
    #[serde(default)]
    pub warehousing_at_customs: Decimal,
    #[serde(default)]
    pub customs_documentation: Decimal,
    #[serde(default)]
    pub brokerage_extra: Decimal,

    #[serde(default)]
    pub insurance_rate: Decimal,
}

/// One product line. Any `Some` override beats the quote default for this
/// product only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,

    pub quantity: i64,
    pub base_price: Decimal,
    #[serde(default)]
    pub weight_in_kg: Decimal,
    #[serde(default)]
    pub country_of_origin: String,
    #[serde(default)]
    pub customs_code: String,
    #[serde(default)]
    pub import_tariff: Decimal,
    #[serde(default)]
    pub excise_rate: Decimal,
    #[serde(default)]
    pub lot_size: Option<i64>,

    // Overrides of QuoteDefaults.
    #[serde(default)]
    pub currency_of_base_price: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub supplier_discount: Option<Decimal>,
    #[serde(default)]
    pub markup: Option<Decimal>,
    #[serde(default)]
    pub vat_rate: Option<Decimal>,
}

fn one() -> Decimal {
    Decimal::ONE
}

fn default_vat_rate() -> Decimal {
    crate::DEFAULT_VAT_RATE
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("ddp".parse::<Incoterms>().unwrap(), Incoterms::Ddp);
        assert_eq!(" Export ".parse::<SaleType>().unwrap(), SaleType::Export);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
    }

    #[test]
    fn test_unknown_enum_value_lists_allowed() {
        let err = "XYZ".parse::<Incoterms>().unwrap_err();
        match err {
            ValidationIssue::NotAllowed { allowed } => {
                assert!(allowed.contains(&"DDP".to_string()));
                assert_eq!(allowed.len(), 7);
            }
            other => panic!("unexpected issue: {:?}", other),
        }
    }

    #[test]
    fn test_dm_fee_wire_format() {
        let fee: DmFee = serde_json::from_str(r#"{"type":"fixed","value":"150.00"}"#).unwrap();
        assert_eq!(fee, DmFee::Fixed(dec!(150.00)));

        let fee: DmFee = serde_json::from_str(r#"{"type":"percent","value":"0.02"}"#).unwrap();
        assert_eq!(fee, DmFee::Percent(dec!(0.02)));
    }

    #[test]
    fn test_admin_settings_from_percent_and_validate() {
        let settings = AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10);
        assert_eq!(settings.financial_agent_rate, dec!(0.02));
        assert!(settings.validate().is_ok());

        let bad = AdminSettings::from_percent(dec!(300), dec!(2), dec!(0.069), 10);
        let err = bad.validate().unwrap_err();
        assert_eq!(err.field, "admin.forex_risk_rate");
    }

    #[test]
    fn test_product_overrides_default_to_none() {
        let item: ProductInput =
            serde_json::from_str(r#"{"quantity": 3, "base_price": "10.50"}"#).unwrap();
        assert_eq!(item.quantity, 3);
        assert!(item.markup.is_none());
        assert!(item.currency_of_base_price.is_none());
    }
}
