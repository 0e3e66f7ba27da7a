//! Phase 1: purchase price conversion into the quote currency.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ArithmeticInconsistencyError;
use crate::money::{self, finalize, RoundingPolicy};
use crate::phases::column;
use crate::validation::NormalizedQuote;

const PHASE: &str = "purchase";

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseLine {
    /// P16: quantity rounded up to whole lots.
    pub ordered_quantity: Decimal,
    /// N16: supplier price after discount, supplier currency.
    pub discounted_price: Decimal,
    /// R16: per-unit purchase price, quote currency.
    pub unit_price: Decimal,
    /// S16: purchase value, the allocation basis.
    pub purchase_value: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchasePhase {
    pub lines: Vec<PurchaseLine>,
    /// S13.
    pub total: Decimal,
    /// G13: chargeable weight in whole kilograms.
    pub chargeable_weight: Decimal,
}

impl PurchasePhase {
    pub fn purchase_values(&self) -> Vec<Decimal> {
        self.lines.iter().map(|line| line.purchase_value).collect()
    }
}

pub fn run(quote: &NormalizedQuote) -> Result<PurchasePhase, ArithmeticInconsistencyError> {
    let currency = quote.terms.currency;
    let mut lines = Vec::with_capacity(quote.products.len());
    let mut weight = Decimal::ZERO;

    for product in &quote.products {
        let lot = Decimal::from(product.lot_size.unwrap_or(1));
        let ordered_quantity = finalize(
            product.quantity_decimal(),
            RoundingPolicy::UpToUnit(lot),
            currency,
        );

        let discounted = money::mul(
            PHASE,
            "N16",
            product.base_price,
            Decimal::ONE - product.supplier_discount,
        )?;
        let unit = money::div(PHASE, "R16", discounted, product.exchange_rate)?;
        let value = money::mul(PHASE, "S16", unit, ordered_quantity)?;
        let purchase_value = money::non_negative(
            PHASE,
            "S16",
            finalize(value, RoundingPolicy::HalfUpMinorUnit, currency),
        )?;

        let line_weight = money::mul(PHASE, "G13", product.weight_in_kg, ordered_quantity)?;
        weight = money::add(PHASE, "G13", weight, line_weight)?;

        lines.push(PurchaseLine {
            ordered_quantity,
            discounted_price: finalize(discounted, RoundingPolicy::HalfUpMinorUnit, currency),
            unit_price: finalize(unit, RoundingPolicy::HalfUpMinorUnit, currency),
            purchase_value,
        });
    }

    let total = column(PHASE, "S13", &lines, |line| line.purchase_value)?;
    debug!(purchase_total = %total, products = lines.len(), "Purchase values converted");

    Ok(PurchasePhase {
        lines,
        total,
        chargeable_weight: finalize(weight, RoundingPolicy::UpToUnit(Decimal::ONE), currency),
    })
}
