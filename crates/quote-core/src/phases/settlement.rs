//! Phase 13: net VAT payable and the final price.

use rust_decimal::Decimal;

use crate::derived::TaxRegime;
use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::pricing::PricingPhase;
use crate::phases::vat::VatPhase;
use crate::phases::{column, PhaseInputs};

const PHASE: &str = "settlement";

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementLine {
    /// AP16: negative when input VAT exceeds output VAT (refundable).
    pub net_vat: Decimal,
    /// AL16
    pub final_total: Decimal,
    /// AM16
    pub final_per_unit: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPhase {
    pub lines: Vec<SettlementLine>,
    /// AP13
    pub net_vat_total: Decimal,
    /// AL13
    pub final_total: Decimal,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    pricing: &PricingPhase,
    vat: &VatPhase,
) -> Result<SettlementPhase, ArithmeticInconsistencyError> {
    let regime = inputs.flags().tax_regime;

    let lines = inputs
        .quote
        .products
        .iter()
        .zip(&pricing.lines)
        .zip(&vat.lines)
        .map(|((product, priced), taxed)| {
            let net_vat = match regime {
                TaxRegime::Russian => taxed.output_vat - taxed.input_vat,
                TaxRegime::Turkish => Decimal::ZERO,
            };
            let final_total = money::sum(
                PHASE,
                "AL16",
                [priced.sale_total, taxed.output_vat, taxed.import_vat_recharge],
            )?;
            let per_unit = money::div(PHASE, "AM16", final_total, product.quantity_decimal())?;
            Ok(SettlementLine {
                net_vat,
                final_total,
                final_per_unit: inputs.round(per_unit),
            })
        })
        .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?;

    Ok(SettlementPhase {
        net_vat_total: column(PHASE, "AP13", &lines, |line| line.net_vat)?,
        final_total: column(PHASE, "AL13", &lines, |line| line.final_total)?,
        lines,
    })
}
