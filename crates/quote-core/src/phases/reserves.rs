//! Phases 6 and 9: admin-rate add-ons distributed across products.
//!
//! Both are switched off by the rule flags for export sales.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::financing::FinancingPhase;
use crate::phases::margin::MarginPhase;
use crate::phases::PhaseInputs;

#[derive(Debug, Clone, PartialEq)]
pub struct ReservePhase {
    pub amounts: Vec<Decimal>,
    pub total: Decimal,
}

/// Phase 6: AH16 = dist(AD13 × forex_risk_rate).
pub fn forex(
    inputs: &PhaseInputs<'_>,
    margin: &MarginPhase,
) -> Result<ReservePhase, ArithmeticInconsistencyError> {
    if !inputs.flags().forex_reserve_applies {
        debug!("Forex reserve suppressed");
        return Ok(suppressed(inputs));
    }

    let total = inputs.round(money::mul(
        "forex_reserve",
        "AH13",
        margin.sale_price_total,
        inputs.settings.forex_risk_rate,
    )?);
    debug!(reserve = %total, "Distributing forex reserve");
    Ok(distributed(inputs, total))
}

/// Phase 9: AI16 = dist(BH9 × financial_agent_rate).
pub fn agent_commission(
    inputs: &PhaseInputs<'_>,
    financing: &FinancingPhase,
) -> Result<ReservePhase, ArithmeticInconsistencyError> {
    if !inputs.flags().agent_commission_applies {
        debug!("Agent commission suppressed");
        return Ok(suppressed(inputs));
    }

    let total = inputs.round(money::mul(
        "agent_commission",
        "AI13",
        financing.financed_amount,
        inputs.settings.financial_agent_rate,
    )?);
    debug!(commission = %total, "Distributing agent commission");
    Ok(distributed(inputs, total))
}

fn distributed(inputs: &PhaseInputs<'_>, total: Decimal) -> ReservePhase {
    ReservePhase {
        amounts: inputs.distribute(total),
        total,
    }
}

fn suppressed(inputs: &PhaseInputs<'_>) -> ReservePhase {
    ReservePhase {
        amounts: inputs.zeros(),
        total: Decimal::ZERO,
    }
}
