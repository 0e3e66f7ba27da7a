//! Phases 7–8: financing cost of the supplier payments and of the
//! operational (logistics and customs) costs.
//!
//! ```text
//! BH2 purchase total           BH6 operational costs (ΣV + ΣW + ΣX + ΣY + ΣZ)
//! BH3 client advance           BH9 financed amount (principal drawn + BH6)
//! BH4 supplier prepayment      BJ7 supplier financing cost
//! BH5 supplier remainder       BJ10 operational financing cost
//!                              BJ11 = BJ7 + BJ10, distributed as BA16
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ArithmeticInconsistencyError;
use crate::financing::{accrue, lump_sum_interest, CashFlow};
use crate::money;
use crate::phases::customs::CustomsPhase;
use crate::phases::logistics::LogisticsPhase;
use crate::phases::margin::MarginPhase;
use crate::phases::purchase::PurchasePhase;
use crate::phases::PhaseInputs;

const PHASE: &str = "financing";

#[derive(Debug, Clone, PartialEq)]
pub struct FinancingPhase {
    /// BH2
    pub purchase_total: Decimal,
    /// BH3
    pub client_advance: Decimal,
    /// BH4
    pub supplier_prepayment: Decimal,
    /// BH5
    pub supplier_remainder: Decimal,
    /// BH6
    pub operational_costs: Decimal,
    /// BH9
    pub financed_amount: Decimal,
    /// BJ7
    pub supplier_financing_cost: Decimal,
    /// BJ10
    pub operational_financing_cost: Decimal,
    /// BJ11
    pub total_financing_cost: Decimal,
    /// BA16
    pub allocated: Vec<Decimal>,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    purchase: &PurchasePhase,
    logistics: &LogisticsPhase,
    customs: &CustomsPhase,
    margin: &MarginPhase,
) -> Result<FinancingPhase, ArithmeticInconsistencyError> {
    let terms = &inputs.quote.terms;
    let derived = inputs.derived;
    let rate = inputs.settings.daily_loan_rate;

    // Phase 7: supplier payments against the client advance
    let purchase_total = purchase.total;
    let client_advance = inputs.round(money::mul(
        PHASE,
        "BH3",
        margin.sale_price_total,
        terms.advance_from_client,
    )?);
    let supplier_prepayment = inputs.round(money::mul(
        PHASE,
        "BH4",
        purchase_total,
        terms.advance_to_supplier,
    )?);
    let supplier_remainder = purchase_total - supplier_prepayment;

    let schedule = [
        CashFlow::outflow(0, supplier_prepayment),
        CashFlow::inflow(terms.time_to_advance, client_advance),
        CashFlow::outflow(terms.delivery_time, supplier_remainder),
    ];
    let supplier = accrue(PHASE, "BJ7", &schedule, derived.final_payment_day, rate)?;
    let supplier_financing_cost = inputs.round(supplier.interest);

    // Phase 8: logistics and customs paid ahead of the client's final payment
    let operational_costs = money::sum(
        PHASE,
        "BH6",
        [
            logistics.logistics_total,
            logistics.brokerage_total,
            logistics.insurance_total,
        ]
        .into_iter()
        .chain(customs.lines.iter().flat_map(|line| [line.duty, line.excise])),
    )?;
    let operational_days = derived
        .final_payment_day
        .saturating_sub(derived.operational_payment_day);
    let operational_financing_cost = inputs.round(lump_sum_interest(
        PHASE,
        "BJ10",
        operational_costs,
        operational_days,
        rate,
    )?);

    let financed_amount = money::add(
        PHASE,
        "BH9",
        inputs.round(supplier.principal_drawn),
        operational_costs,
    )?;
    let total_financing_cost = money::add(
        PHASE,
        "BJ11",
        supplier_financing_cost,
        operational_financing_cost,
    )?;

    debug!(
        financed = %financed_amount,
        supplier_cost = %supplier_financing_cost,
        operational_cost = %operational_financing_cost,
        operational_days,
        "Distributing financing cost"
    );

    Ok(FinancingPhase {
        purchase_total,
        client_advance,
        supplier_prepayment,
        supplier_remainder,
        operational_costs,
        financed_amount,
        supplier_financing_cost,
        operational_financing_cost,
        total_financing_cost,
        allocated: inputs.distribute(total_financing_cost),
    })
}
