//! Phase 2: logistics legs, brokerage and insurance, distributed by value.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::purchase::PurchasePhase;
use crate::phases::PhaseInputs;

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticsLine {
    /// V16
    pub logistics: Decimal,
    /// W16
    pub brokerage: Decimal,
    /// X16
    pub insurance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticsPhase {
    pub lines: Vec<LogisticsLine>,
    /// BF2
    pub supplier_hub: Decimal,
    /// BF3
    pub hub_customs: Decimal,
    /// BF4
    pub customs_client: Decimal,
    /// V13
    pub logistics_total: Decimal,
    /// BF5 / W13
    pub brokerage_total: Decimal,
    /// X13
    pub insurance_total: Decimal,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    purchase: &PurchasePhase,
) -> Result<LogisticsPhase, ArithmeticInconsistencyError> {
    let terms = &inputs.quote.terms;

    let logistics_total = inputs.round(inputs.derived.logistics_total);
    let brokerage_total = inputs.round(inputs.derived.brokerage_total);
    let insurance_total = inputs.round(money::mul(
        "logistics",
        "X13",
        purchase.total,
        terms.insurance_rate,
    )?);

    debug!(
        logistics = %logistics_total,
        brokerage = %brokerage_total,
        insurance = %insurance_total,
        "Distributing logistics"
    );

    let lines = inputs
        .distribute(logistics_total)
        .into_iter()
        .zip(inputs.distribute(brokerage_total))
        .zip(inputs.distribute(insurance_total))
        .map(|((logistics, brokerage), insurance)| LogisticsLine {
            logistics,
            brokerage,
            insurance,
        })
        .collect();

    Ok(LogisticsPhase {
        lines,
        supplier_hub: inputs.round(terms.logistics_supplier_hub),
        hub_customs: inputs.round(terms.logistics_hub_customs),
        customs_client: inputs.round(terms.logistics_customs_client),
        logistics_total,
        brokerage_total,
        insurance_total,
    })
}
