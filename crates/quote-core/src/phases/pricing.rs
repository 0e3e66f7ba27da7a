//! Phase 11: sale price without VAT.

use rust_decimal::Decimal;

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::cogs::CogsPhase;
use crate::phases::margin::MarginPhase;
use crate::phases::{column, PhaseInputs};

const PHASE: &str = "pricing";

#[derive(Debug, Clone, PartialEq)]
pub struct PricingLine {
    /// AK16
    pub sale_total: Decimal,
    /// AJ16
    pub sale_per_unit: Decimal,
    /// AF16
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingPhase {
    pub lines: Vec<PricingLine>,
    /// AK13
    pub sale_total: Decimal,
    /// AF13
    pub profit_total: Decimal,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    cogs: &CogsPhase,
    margin: &MarginPhase,
) -> Result<PricingPhase, ArithmeticInconsistencyError> {
    let lines = inputs
        .quote
        .products
        .iter()
        .zip(&cogs.lines)
        .zip(&margin.lines)
        .map(|((product, cost), priced)| {
            let raw = money::sum(PHASE, "AK16", [cost.total, priced.markup, priced.dm_fee])?;
            let sale_total = inputs.round(raw);
            let per_unit = money::div(PHASE, "AJ16", raw, product.quantity_decimal())?;
            Ok(PricingLine {
                sale_total,
                sale_per_unit: inputs.round(per_unit),
                profit: sale_total - cost.total,
            })
        })
        .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?;

    let sale_total = money::non_negative(
        PHASE,
        "AK13",
        column(PHASE, "AK13", &lines, |line| line.sale_total)?,
    )?;

    Ok(PricingPhase {
        profit_total: column(PHASE, "AF13", &lines, |line| line.profit)?,
        sale_total,
        lines,
    })
}
