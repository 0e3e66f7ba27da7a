//! Phase 3: import duty and excise on the converted purchase value.

use rust_decimal::Decimal;

use crate::error::ArithmeticInconsistencyError;
use crate::money;
use crate::phases::purchase::PurchasePhase;
use crate::phases::PhaseInputs;

const PHASE: &str = "customs";

#[derive(Debug, Clone, PartialEq)]
pub struct CustomsLine {
    /// Y16
    pub duty: Decimal,
    /// Z16
    pub excise: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomsPhase {
    pub lines: Vec<CustomsLine>,
}

pub fn run(
    inputs: &PhaseInputs<'_>,
    purchase: &PurchasePhase,
) -> Result<CustomsPhase, ArithmeticInconsistencyError> {
    let lines = inputs
        .quote
        .products
        .iter()
        .zip(&purchase.lines)
        .map(|(product, bought)| {
            Ok(CustomsLine {
                duty: inputs.round(money::mul(
                    PHASE,
                    "Y16",
                    bought.purchase_value,
                    product.import_tariff,
                )?),
                excise: inputs.round(money::mul(
                    PHASE,
                    "Z16",
                    bought.purchase_value,
                    product.excise_rate,
                )?),
            })
        })
        .collect::<Result<Vec<_>, ArithmeticInconsistencyError>>()?;

    Ok(CustomsPhase { lines })
}
