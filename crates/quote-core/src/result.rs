//! # Calculation Result
//!
//! Per-product rows and quote-level totals, serialized under the legacy
//! spreadsheet cell identifiers. Export, analytics and stored calculation
//! snapshots read these names, so they are a compatibility surface: renaming
//! a field here is a breaking change.
//!
//! Money serializes as decimal strings (`"1234.50"`), never as floats.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::derived::{DealKind, RuleFlags};
use crate::engine::ExecutionPath;
use crate::types::{Currency, Incoterms};

// =============================================================================
// Per-Product Row
// =============================================================================

/// Every phase output for one product (row 16 of the legacy sheet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResult {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: i64,

    // Phase 1
    #[serde(rename = "P16")]
    pub ordered_quantity: Decimal,
    #[serde(rename = "N16")]
    pub discounted_base_price: Decimal,
    #[serde(rename = "R16")]
    pub purchase_price_per_unit: Decimal,
    #[serde(rename = "S16")]
    pub purchase_price_total: Decimal,
    #[serde(rename = "BD16")]
    pub distribution_key: Decimal,

    // Phases 2–3
    #[serde(rename = "V16")]
    pub logistics: Decimal,
    #[serde(rename = "W16")]
    pub brokerage: Decimal,
    #[serde(rename = "X16")]
    pub insurance: Decimal,
    #[serde(rename = "Y16")]
    pub customs_duty: Decimal,
    #[serde(rename = "Z16")]
    pub excise_tax: Decimal,

    // Phases 4–5
    #[serde(rename = "AA16")]
    pub cogs_base: Decimal,
    #[serde(rename = "AB16")]
    pub cogs_base_per_unit: Decimal,
    #[serde(rename = "AC16")]
    pub markup: Decimal,
    #[serde(rename = "AG16")]
    pub dm_fee: Decimal,
    #[serde(rename = "AD16")]
    pub sale_price_before_reserves: Decimal,

    // Phases 6–10
    #[serde(rename = "AH16")]
    pub forex_reserve: Decimal,
    #[serde(rename = "BA16")]
    pub financing_cost: Decimal,
    #[serde(rename = "AI16")]
    pub agent_commission: Decimal,
    #[serde(rename = "AX16")]
    pub cogs_total: Decimal,
    #[serde(rename = "AY16")]
    pub cogs_per_unit: Decimal,

    // Phase 11
    #[serde(rename = "AK16")]
    pub sale_price_total: Decimal,
    #[serde(rename = "AJ16")]
    pub sale_price_per_unit: Decimal,
    #[serde(rename = "AF16")]
    pub profit: Decimal,

    // Phases 12–13
    #[serde(rename = "AN16")]
    pub output_vat: Decimal,
    #[serde(rename = "AO16")]
    pub input_vat_deductible: Decimal,
    #[serde(rename = "AQ16")]
    pub import_vat_recharge: Decimal,
    #[serde(rename = "AP16")]
    pub net_vat_payable: Decimal,
    #[serde(rename = "AL16")]
    pub final_price_total: Decimal,
    #[serde(rename = "AM16")]
    pub final_price_per_unit: Decimal,
}

// =============================================================================
// Quote-Level Totals
// =============================================================================

/// Column sums (row 13) plus the fields that only exist at quote level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTotals {
    #[serde(rename = "S13")]
    pub purchase_price_total: Decimal,
    #[serde(rename = "V13")]
    pub logistics: Decimal,
    #[serde(rename = "W13")]
    pub brokerage: Decimal,
    #[serde(rename = "X13")]
    pub insurance: Decimal,
    #[serde(rename = "Y13")]
    pub customs_duty: Decimal,
    #[serde(rename = "Z13")]
    pub excise_tax: Decimal,
    #[serde(rename = "AA13")]
    pub cogs_base: Decimal,
    #[serde(rename = "AC13")]
    pub markup: Decimal,
    #[serde(rename = "AG13")]
    pub dm_fee: Decimal,
    #[serde(rename = "AD13")]
    pub sale_price_before_reserves: Decimal,
    #[serde(rename = "AH13")]
    pub forex_reserve: Decimal,
    #[serde(rename = "BA13")]
    pub financing_cost: Decimal,
    #[serde(rename = "AI13")]
    pub agent_commission: Decimal,
    #[serde(rename = "AX13")]
    pub cogs_total: Decimal,
    #[serde(rename = "AK13")]
    pub sale_price_total: Decimal,
    #[serde(rename = "AF13")]
    pub profit: Decimal,
    #[serde(rename = "AN13")]
    pub output_vat: Decimal,
    #[serde(rename = "AO13")]
    pub input_vat_deductible: Decimal,
    #[serde(rename = "AQ13")]
    pub import_vat_recharge: Decimal,
    #[serde(rename = "AP13")]
    pub net_vat_payable: Decimal,
    #[serde(rename = "AL13")]
    pub final_total_with_vat: Decimal,

    /// G13, whole kilograms.
    #[serde(rename = "G13")]
    pub chargeable_weight: Decimal,

    #[serde(rename = "BF2")]
    pub logistics_supplier_hub: Decimal,
    #[serde(rename = "BF3")]
    pub logistics_hub_customs: Decimal,
    #[serde(rename = "BF4")]
    pub logistics_customs_client: Decimal,
    #[serde(rename = "BF5")]
    pub brokerage_total: Decimal,

    #[serde(rename = "BH2")]
    pub financing_purchase_total: Decimal,
    #[serde(rename = "BH3")]
    pub client_advance: Decimal,
    #[serde(rename = "BH4")]
    pub supplier_prepayment: Decimal,
    #[serde(rename = "BH5")]
    pub supplier_remainder: Decimal,
    #[serde(rename = "BH6")]
    pub operational_costs: Decimal,
    #[serde(rename = "BH9")]
    pub financed_amount: Decimal,
    #[serde(rename = "BJ7")]
    pub supplier_financing_cost: Decimal,
    #[serde(rename = "BJ10")]
    pub operational_financing_cost: Decimal,
    #[serde(rename = "BJ11")]
    pub total_financing_cost: Decimal,

    /// BL3: days from the quote date to the client's final payment.
    #[serde(rename = "BL3")]
    pub final_payment_day: u32,
    /// BL4: only when the request carries a quote date.
    #[serde(rename = "BL4", default, skip_serializing_if = "Option::is_none")]
    pub final_payment_date: Option<NaiveDate>,
}

// =============================================================================
// Result
// =============================================================================

/// A fully priced quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub currency: Currency,
    pub incoterms: Incoterms,
    pub deal: DealKind,
    pub flags: RuleFlags,
    pub path: ExecutionPath,
    pub products: Vec<ProductResult>,
    pub totals: QuoteTotals,
}

impl CalculationResult {
    /// Looks up a product row by its position in the request.
    pub fn product(&self, index: usize) -> Option<&ProductResult> {
        self.products.iter().find(|product| product.index == index)
    }
}
