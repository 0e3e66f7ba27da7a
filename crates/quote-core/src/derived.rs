//! # Derived Variables
//!
//! Values computed from the normalized inputs before any phase runs, plus
//! the rule flags that switch the special-case branches.
//!
//! ## Deal Kind × Rule Flags
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               sale type        │ forex │ agent │ markup base │ VAT base │
//! │  ──────────────────────────────┼───────┼───────┼─────────────┼──────────│
//! │  Domestic (supply)             │  yes  │  yes  │  base COGS  │  full    │
//! │  Export                        │  no   │  no   │  base COGS  │  none    │
//! │  Transit                       │  yes  │  yes  │  goods only │  margin  │
//! │                                                                         │
//! │  seller jurisdiction: Russia → Russian VAT regime                      │
//! │                       Turkey → Turkish regime (no Russian output VAT,  │
//! │                                import VAT recharged to the client)     │
//! │                                                                         │
//! │  input VAT deductible  ⇔  incoterms == DDP  ∧  sale type ≠ export      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The flags are resolved ONCE here and handed to the phases. Phases never
//! re-derive a condition from the raw sale type or incoterms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::types::{AdminSettings, Incoterms, SaleType, SellerCountry};
use crate::validation::NormalizedQuote;

const PHASE: &str = "derived";

// =============================================================================
// Deal Kind
// =============================================================================

/// Sale type × seller jurisdiction, as one tagged variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DealKind {
    Domestic { seller: SellerCountry },
    Export { seller: SellerCountry },
    Transit { seller: SellerCountry },
}

impl DealKind {
    pub fn new(sale_type: SaleType, seller: SellerCountry) -> Self {
        match sale_type {
            SaleType::Supply => DealKind::Domestic { seller },
            SaleType::Export => DealKind::Export { seller },
            SaleType::Transit => DealKind::Transit { seller },
        }
    }

    pub fn seller(&self) -> SellerCountry {
        match *self {
            DealKind::Domestic { seller }
            | DealKind::Export { seller }
            | DealKind::Transit { seller } => seller,
        }
    }

    pub fn sale_type(&self) -> SaleType {
        match self {
            DealKind::Domestic { .. } => SaleType::Supply,
            DealKind::Export { .. } => SaleType::Export,
            DealKind::Transit { .. } => SaleType::Transit,
        }
    }

    pub fn is_export(&self) -> bool {
        matches!(self, DealKind::Export { .. })
    }
}

// =============================================================================
// Rule Flags
// =============================================================================

/// Which VAT regime the selling entity falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    Russian,
    Turkish,
}

/// What output VAT is charged on (Russian regime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatBase {
    /// Whole sale price.
    Full,
    /// Only the seller's margin (transit resale).
    MarginOnly,
    /// Zero-rated (export).
    None,
}

/// Special-case switches consumed by the phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFlags {
    pub forex_reserve_applies: bool,
    pub agent_commission_applies: bool,
    pub markup_on_goods_only: bool,
    pub input_vat_deductible: bool,
    pub tax_regime: TaxRegime,
    pub output_vat_base: VatBase,
}

impl RuleFlags {
    pub fn resolve(deal: DealKind, incoterms: Incoterms) -> Self {
        let tax_regime = match deal.seller() {
            SellerCountry::Russia => TaxRegime::Russian,
            SellerCountry::Turkey => TaxRegime::Turkish,
        };

        let (forex, agent, goods_only, vat_base) = match deal {
            DealKind::Domestic { .. } => (true, true, false, VatBase::Full),
            DealKind::Export { .. } => (false, false, false, VatBase::None),
            DealKind::Transit { .. } => (true, true, true, VatBase::MarginOnly),
        };

        RuleFlags {
            forex_reserve_applies: forex,
            agent_commission_applies: agent,
            markup_on_goods_only: goods_only,
            input_vat_deductible: incoterms == Incoterms::Ddp && !deal.is_export(),
            tax_regime,
            output_vat_base: vat_base,
        }
    }
}

// =============================================================================
// Derived Variables
// =============================================================================

/// Quote-level values derived before the pipeline starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedVariables {
    pub flags: RuleFlags,

    /// Sum of the three logistics legs.
    pub logistics_total: Decimal,

    /// Sum of the customs/brokerage constants.
    pub brokerage_total: Decimal,

    /// Day the client pays the remainder (delivery + receiving delay).
    pub final_payment_day: u32,

    /// Day customs and logistics are paid.
    pub operational_payment_day: u32,
}

/// Resolves derived variables from the normalized inputs and admin settings.
///
/// ## Errors
/// `ArithmeticInconsistencyError` when the logistics legs or the brokerage
/// constants sum past the decimal range.
pub fn resolve(
    quote: &NormalizedQuote,
    settings: &AdminSettings,
) -> Result<DerivedVariables, ArithmeticInconsistencyError> {
    let terms = &quote.terms;

    // normalize() already rejected an overflowing sum
    let final_payment_day = terms.delivery_time + terms.time_to_advance_on_receiving;

    Ok(DerivedVariables {
        flags: RuleFlags::resolve(terms.deal, terms.incoterms),
        logistics_total: money::sum(
            PHASE,
            "V13",
            [
                terms.logistics_supplier_hub,
                terms.logistics_hub_customs,
                terms.logistics_customs_client,
            ],
        )?,
        brokerage_total: money::sum(
            PHASE,
            "BF5",
            [
                terms.brokerage_hub,
                terms.brokerage_customs,
                terms.warehousing_at_customs,
                terms.customs_documentation,
                terms.brokerage_extra,
            ],
        )?,
        final_payment_day,
        operational_payment_day: terms
            .delivery_time
            .saturating_sub(settings.customs_logistics_pmt_due),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_INCOTERMS: [Incoterms; 7] = [
        Incoterms::Ddp,
        Incoterms::Dap,
        Incoterms::Cif,
        Incoterms::Cpt,
        Incoterms::Fca,
        Incoterms::Fob,
        Incoterms::Exw,
    ];

    #[test]
    fn test_input_vat_deductible_only_for_ddp_non_export() {
        for sale_type in [SaleType::Supply, SaleType::Export, SaleType::Transit] {
            for seller in [SellerCountry::Russia, SellerCountry::Turkey] {
                for incoterms in ALL_INCOTERMS {
                    let flags = RuleFlags::resolve(DealKind::new(sale_type, seller), incoterms);
                    let expected = incoterms == Incoterms::Ddp && sale_type != SaleType::Export;
                    assert_eq!(flags.input_vat_deductible, expected, "{sale_type} {incoterms}");
                }
            }
        }
    }

    #[test]
    fn test_export_suppresses_reserves() {
        let flags = RuleFlags::resolve(
            DealKind::new(SaleType::Export, SellerCountry::Russia),
            Incoterms::Fob,
        );
        assert!(!flags.forex_reserve_applies);
        assert!(!flags.agent_commission_applies);
        assert_eq!(flags.output_vat_base, VatBase::None);
    }

    #[test]
    fn test_transit_marks_up_goods_only() {
        let flags = RuleFlags::resolve(
            DealKind::new(SaleType::Transit, SellerCountry::Russia),
            Incoterms::Dap,
        );
        assert!(flags.markup_on_goods_only);
        assert_eq!(flags.output_vat_base, VatBase::MarginOnly);
    }

    #[test]
    fn test_turkish_seller_regime() {
        let flags = RuleFlags::resolve(
            DealKind::new(SaleType::Supply, SellerCountry::Turkey),
            Incoterms::Ddp,
        );
        assert_eq!(flags.tax_regime, TaxRegime::Turkish);
        assert!(flags.input_vat_deductible);
    }

    #[test]
    fn test_deal_kind_round_trips_sale_type() {
        let deal = DealKind::new(SaleType::Transit, SellerCountry::Turkey);
        assert_eq!(deal.sale_type(), SaleType::Transit);
        assert_eq!(deal.seller(), SellerCountry::Turkey);
    }
}
