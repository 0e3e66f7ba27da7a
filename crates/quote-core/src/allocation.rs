//! # Distribution Allocator
//!
//! Splits quote-level totals (logistics, brokerage, insurance, fixed fee,
//! forex reserve, financing, agent commission) across products in
//! proportion to their purchase value.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key_i = S16_i / Σ S16          (value-based, not quantity-based)      │
//! │                                                                         │
//! │  distribute(total):                                                    │
//! │    T      = half-up(total)              quote-level total finalized    │
//! │    d_i    = half-up(T × key_i)          for every product but the last │
//! │    d_last = T − Σ d_i                   rounding remainder goes here   │
//! │                                                                         │
//! │  ⇒ Σ d_i == T exactly                                                  │
//! │                                                                         │
//! │  Example: T = 10.00, keys = [⅓, ⅓, ⅓]                                  │
//! │    d = [3.33, 3.33, 3.34]                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are computed once, right after phase 1, and reused unchanged by every
//! later phase.

use rust_decimal::Decimal;

use crate::error::ArithmeticInconsistencyError;
use crate::money::{self, finalize, RoundingPolicy};
use crate::types::Currency;

const PHASE: &str = "allocation";

/// Per-product distribution keys, in product order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationKeys {
    keys: Vec<Decimal>,
}

impl AllocationKeys {
    /// Single-product path: key = 1, distribution is the identity.
    pub fn single() -> Self {
        AllocationKeys {
            keys: vec![Decimal::ONE],
        }
    }

    /// Multi-product path: key_i = value_i / Σ value.
    ///
    /// ## Errors
    /// `ArithmeticInconsistencyError` when the allocation base is zero.
    pub fn from_purchase_values(values: &[Decimal]) -> Result<Self, ArithmeticInconsistencyError> {
        if values.is_empty() {
            return Err(ArithmeticInconsistencyError::new(
                PHASE,
                "BD16",
                "no products to allocate across",
            ));
        }

        let mut base = Decimal::ZERO;
        for value in values {
            money::non_negative(PHASE, "S16", *value)?;
            base = base.checked_add(*value).ok_or_else(|| {
                ArithmeticInconsistencyError::new(PHASE, "S13", "purchase base overflows")
            })?;
        }

        let keys = values
            .iter()
            .map(|value| money::div(PHASE, "BD16", *value, base))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AllocationKeys { keys })
    }

    pub fn keys(&self) -> &[Decimal] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Splits `total` so that the parts sum to the rounded total exactly.
    pub fn distribute(&self, total: Decimal, currency: Currency) -> Vec<Decimal> {
        let total = finalize(total, RoundingPolicy::HalfUpMinorUnit, currency);

        let Some((_, head)) = self.keys.split_last() else {
            return Vec::new();
        };

        let mut parts = Vec::with_capacity(self.keys.len());
        let mut assigned = Decimal::ZERO;
        for key in head {
            let part = finalize(total * *key, RoundingPolicy::HalfUpMinorUnit, currency);
            assigned += part;
            parts.push(part);
        }
        parts.push(total - assigned);
        parts
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_keys_sum_to_one() {
        let keys = AllocationKeys::from_purchase_values(&[dec!(100), dec!(200), dec!(300)]).unwrap();
        let sum: Decimal = keys.keys().iter().sum();
        assert!((sum - Decimal::ONE).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_keys_are_value_based() {
        let keys = AllocationKeys::from_purchase_values(&[dec!(300), dec!(100)]).unwrap();
        assert_eq!(keys.keys(), &[dec!(0.75), dec!(0.25)]);
    }

    #[test]
    fn test_remainder_goes_to_last_product() {
        let keys = AllocationKeys::from_purchase_values(&[dec!(1), dec!(1), dec!(1)]).unwrap();
        let parts = keys.distribute(dec!(10.00), Currency::Usd);
        assert_eq!(parts, vec![dec!(3.33), dec!(3.33), dec!(3.34)]);
    }

    #[test]
    fn test_total_is_rounded_once_then_reconciled() {
        let keys = AllocationKeys::from_purchase_values(&[dec!(2), dec!(1)]).unwrap();
        let parts = keys.distribute(dec!(100.005), Currency::Eur);
        let sum: Decimal = parts.iter().sum();
        assert_eq!(sum, dec!(100.01));
        assert_eq!(parts[0], dec!(66.67));
        assert_eq!(parts[1], dec!(33.34));
    }

    #[test]
    fn test_single_is_identity() {
        let parts = AllocationKeys::single().distribute(dec!(175.25), Currency::Usd);
        assert_eq!(parts, vec![dec!(175.25)]);
    }

    #[test]
    fn test_zero_base_is_inconsistency() {
        let err = AllocationKeys::from_purchase_values(&[dec!(0), dec!(0)]).unwrap_err();
        assert_eq!(err.field, "BD16");
    }
}
