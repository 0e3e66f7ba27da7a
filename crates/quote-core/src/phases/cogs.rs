//! Phases 4 and 10: cost of goods sold, before and after financing add-ons.
//!
//! ```text
//! AA16 = S16 + V16 + W16 + X16 + Y16 + Z16          (phase 4, base)
//! AX16 = AA16 + AH16 + BA16 + AI16                  (phase 10, final)
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::customs::CustomsPhase;
use crate::phases::financing::FinancingPhase;
use crate::phases::logistics::LogisticsPhase;
use crate::phases::purchase::PurchasePhase;
use crate::phases::reserves::ReservePhase;
use crate::phases::{column, PhaseInputs};

#[derive(Debug, Clone, PartialEq)]
pub struct CogsLine {
    pub total: Decimal,
    pub per_unit: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CogsPhase {
    pub lines: Vec<CogsLine>,
    pub total: Decimal,
}

/// Phase 4: AA16 and AB16.
pub fn base(
    inputs: &PhaseInputs<'_>,
    purchase: &PurchasePhase,
    logistics: &LogisticsPhase,
    customs: &CustomsPhase,
) -> Result<CogsPhase, ArithmeticInconsistencyError> {
    let totals = purchase
        .lines
        .iter()
        .zip(&logistics.lines)
        .zip(&customs.lines)
        .map(|((bought, moved), cleared)| {
            money::sum(
                "base_cogs",
                "AA16",
                [
                    bought.purchase_value,
                    moved.logistics,
                    moved.brokerage,
                    moved.insurance,
                    cleared.duty,
                    cleared.excise,
                ],
            )
        })
        .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?;

    let phase = per_unit(inputs, "base_cogs", ["AB16", "AA13"], totals)?;
    money::non_negative("base_cogs", "AA13", phase.total)?;
    debug!(cogs = %phase.total, "Base COGS aggregated");
    Ok(phase)
}

/// Phase 10: AX16 and AY16.
pub fn finalize(
    inputs: &PhaseInputs<'_>,
    base: &CogsPhase,
    forex: &ReservePhase,
    financing: &FinancingPhase,
    agent: &ReservePhase,
) -> Result<CogsPhase, ArithmeticInconsistencyError> {
    let totals = base
        .lines
        .iter()
        .zip(&forex.amounts)
        .zip(&financing.allocated)
        .zip(&agent.amounts)
        .map(|(((cogs, reserve), financed), commission)| {
            money::sum("final_cogs", "AX16", [cogs.total, *reserve, *financed, *commission])
        })
        .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?;

    let phase = per_unit(inputs, "final_cogs", ["AY16", "AX13"], totals)?;
    money::non_negative("final_cogs", "AX13", phase.total)?;
    debug!(cogs = %phase.total, "Final COGS aggregated");
    Ok(phase)
}

fn per_unit(
    inputs: &PhaseInputs<'_>,
    phase: &'static str,
    [unit_field, total_field]: [&'static str; 2],
    totals: Vec<Decimal>,
) -> Result<CogsPhase, ArithmeticInconsistencyError> {
    let lines = totals
        .into_iter()
        .zip(&inputs.quote.products)
        .map(|(total, product)| {
            let unit = money::div(phase, unit_field, total, product.quantity_decimal())?;
            Ok(CogsLine {
                total,
                per_unit: inputs.round(unit),
            })
        })
        .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?;

    Ok(CogsPhase {
        total: column(phase, total_field, &lines, |line| line.total)?,
        lines,
    })
}
