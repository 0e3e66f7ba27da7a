//! Phase 5: markup and the decision-maker fee on top of base COGS.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::cogs::CogsPhase;
use crate::phases::purchase::PurchasePhase;
use crate::phases::{column, PhaseInputs};
use crate::types::DmFee;

const PHASE: &str = "margin";

#[derive(Debug, Clone, PartialEq)]
pub struct MarginLine {
    /// AC16
    pub markup: Decimal,
    /// AG16
    pub dm_fee: Decimal,
    /// AD16: pre-tax sale price before reserves.
    pub sale_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginPhase {
    pub lines: Vec<MarginLine>,
    /// AC13
    pub markup_total: Decimal,
    /// AG13
    pub dm_fee_total: Decimal,
    /// AD13
    pub sale_price_total: Decimal,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    purchase: &PurchasePhase,
    cogs: &CogsPhase,
) -> Result<MarginPhase, ArithmeticInconsistencyError> {
    let goods_only = inputs.flags().markup_on_goods_only;

    let fees = match inputs.quote.terms.dm_fee {
        DmFee::Fixed(amount) => inputs.distribute(amount),
        DmFee::Percent(rate) => cogs
            .lines
            .iter()
            .map(|line| Ok(inputs.round(money::mul(PHASE, "AG16", line.total, rate)?)))
            .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?,
    };

    let mut lines = Vec::with_capacity(fees.len());
    for (((product, bought), base), dm_fee) in inputs
        .quote
        .products
        .iter()
        .zip(&purchase.lines)
        .zip(&cogs.lines)
        .zip(fees)
    {
        let markup_base = if goods_only {
            bought.purchase_value
        } else {
            base.total
        };
        let markup = inputs.round(money::mul(PHASE, "AC16", markup_base, product.markup)?);

        lines.push(MarginLine {
            markup,
            dm_fee,
            sale_price: money::sum(PHASE, "AD16", [base.total, markup, dm_fee])?,
        });
    }

    let phase = MarginPhase {
        markup_total: column(PHASE, "AC13", &lines, |line| line.markup)?,
        dm_fee_total: column(PHASE, "AG13", &lines, |line| line.dm_fee)?,
        sale_price_total: column(PHASE, "AD13", &lines, |line| line.sale_price)?,
        lines,
    };
    debug!(
        markup = %phase.markup_total,
        dm_fee = %phase.dm_fee_total,
        goods_only,
        "Margin applied"
    );
    Ok(phase)
}
