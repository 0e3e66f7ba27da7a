//! Phase 12: output VAT, deductible input VAT and the Turkish import-VAT
//! recharge.
//!
//! ```text
//! regime   │ output VAT (AN16)                 │ recharge (AQ16)
//! ─────────┼───────────────────────────────────┼────────────────
//! Russian  │ Full       → AK16 × vat           │ 0
//!          │ MarginOnly → AF16 × vat           │
//!          │ None       → 0                    │
//! Turkish  │ 0                                 │ AO16
//!
//! AO16 = (S16 + V16 + Y16 + Z16) × vat   iff input VAT is deductible, else 0
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::derived::{TaxRegime, VatBase};
use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::customs::CustomsPhase;
use crate::phases::logistics::LogisticsPhase;
use crate::phases::pricing::PricingPhase;
use crate::phases::purchase::PurchasePhase;
use crate::phases::{column, PhaseInputs};

const PHASE: &str = "vat";

#[derive(Debug, Clone, PartialEq)]
pub struct VatLine {
    /// AN16
    pub output_vat: Decimal,
    /// AO16
    pub input_vat: Decimal,
    /// AQ16
    pub import_vat_recharge: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VatPhase {
    pub lines: Vec<VatLine>,
    pub output_vat_total: Decimal,
    pub input_vat_total: Decimal,
    pub import_vat_recharge_total: Decimal,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    purchase: &PurchasePhase,
    logistics: &LogisticsPhase,
    customs: &CustomsPhase,
    pricing: &PricingPhase,
) -> Result<VatPhase, ArithmeticInconsistencyError> {
    let flags = *inputs.flags();

    let mut lines = Vec::with_capacity(pricing.lines.len());
    for ((((product, bought), moved), cleared), priced) in inputs
        .quote
        .products
        .iter()
        .zip(&purchase.lines)
        .zip(&logistics.lines)
        .zip(&customs.lines)
        .zip(&pricing.lines)
    {
        let vat = product.vat_rate;

        let input_vat = if flags.input_vat_deductible {
            let import_base = money::sum(
                PHASE,
                "AO16",
                [bought.purchase_value, moved.logistics, cleared.duty, cleared.excise],
            )?;
            inputs.round(money::mul(PHASE, "AO16", import_base, vat)?)
        } else {
            Decimal::ZERO
        };

        let (output_vat, import_vat_recharge) = match flags.tax_regime {
            TaxRegime::Russian => {
                let output = match flags.output_vat_base {
                    VatBase::Full => inputs.round(money::mul(PHASE, "AN16", priced.sale_total, vat)?),
                    VatBase::MarginOnly => inputs.round(money::mul(PHASE, "AN16", priced.profit, vat)?),
                    VatBase::None => Decimal::ZERO,
                };
                (output, Decimal::ZERO)
            }
            TaxRegime::Turkish => (Decimal::ZERO, input_vat),
        };

        lines.push(VatLine {
            output_vat,
            input_vat,
            import_vat_recharge,
        });
    }

    let phase = VatPhase {
        output_vat_total: column(PHASE, "AN13", &lines, |line| line.output_vat)?,
        input_vat_total: column(PHASE, "AO13", &lines, |line| line.input_vat)?,
        import_vat_recharge_total: column(PHASE, "AQ13", &lines, |line| line.import_vat_recharge)?,
        lines,
    };
    debug!(
        regime = ?flags.tax_regime,
        output_vat = %phase.output_vat_total,
        input_vat = %phase.input_vat_total,
        "VAT computed"
    );
    Ok(phase)
}
