//! # Money Module (Precision Guard)
//!
//! Decimal arithmetic discipline for every monetary and rate value.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                             │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The legacy spreadsheet is matched to 0.1%; drift from floats in a     │
//! │  13-phase pipeline would eat that tolerance.                           │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal::Decimal (28 significant digits)           │
//! │    Intermediates keep full precision.                                  │
//! │    Each externally visible field is rounded ONCE, by a named policy.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policies
//! | Policy             | Used for                                      |
//! |--------------------|-----------------------------------------------|
//! | `HalfUpMinorUnit`  | anything paid or invoiced                     |
//! | `UpToUnit(n)`      | ceiling rules: lot sizes, chargeable weight   |
//!
//! ## Usage
//! ```rust
//! use quote_core::money::{finalize, RoundingPolicy};
//! use quote_core::types::Currency;
//! use rust_decimal_macros::dec;
//!
//! let invoiced = finalize(dec!(10.005), RoundingPolicy::HalfUpMinorUnit, Currency::Usd);
//! assert_eq!(invoiced, dec!(10.01));
//!
//! let lots = finalize(dec!(7), RoundingPolicy::UpToUnit(dec!(5)), Currency::Usd);
//! assert_eq!(lots, dec!(10));
//! ```

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::error::ArithmeticInconsistencyError;
use crate::types::Currency;

// =============================================================================
// Rounding Policy
// =============================================================================

/// A rounding rule, named explicitly at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingPolicy {
    /// Round half away from zero to the currency's minor unit.
    HalfUpMinorUnit,

    /// Round up to the next multiple of the given unit.
    UpToUnit(Decimal),
}

/// Applies a rounding policy. This is the ONLY place rounding happens.
pub fn finalize(value: Decimal, policy: RoundingPolicy, currency: Currency) -> Decimal {
    match policy {
        RoundingPolicy::HalfUpMinorUnit => value.round_dp_with_strategy(
            currency.minor_units(),
            RoundingStrategy::MidpointAwayFromZero,
        ),
        RoundingPolicy::UpToUnit(unit) => round_up_to_unit(value, unit),
    }
}

fn round_up_to_unit(value: Decimal, unit: Decimal) -> Decimal {
    if unit <= Decimal::ZERO {
        return value;
    }
    (value / unit).ceil() * unit
}

// =============================================================================
// Checked Helpers
// =============================================================================

/// Checked addition; overflow is an arithmetic inconsistency.
pub fn add(
    phase: &'static str,
    field: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    a.checked_add(b)
        .ok_or_else(|| ArithmeticInconsistencyError::new(phase, field, format!("{} + {} overflows", a, b)))
}

/// Checked sum of any number of terms.
///
/// ## Example
/// ```rust
/// use quote_core::money::sum;
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(sum("logistics", "V13", [dec!(1.5), dec!(2.25)]).unwrap(), dec!(3.75));
/// assert!(sum("logistics", "V13", [Decimal::MAX, Decimal::ONE]).is_err());
/// ```
pub fn sum<I>(phase: &'static str, field: &'static str, terms: I) -> Result<Decimal, ArithmeticInconsistencyError>
where
    I: IntoIterator<Item = Decimal>,
{
    terms
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, term| add(phase, field, acc, term))
}

/// Checked multiplication; overflow is an arithmetic inconsistency.
pub fn mul(
    phase: &'static str,
    field: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    a.checked_mul(b)
        .ok_or_else(|| ArithmeticInconsistencyError::new(phase, field, format!("{} × {} overflows", a, b)))
}

/// Checked division; a zero divisor is an arithmetic inconsistency.
pub fn div(
    phase: &'static str,
    field: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    if b.is_zero() {
        return Err(ArithmeticInconsistencyError::new(
            phase,
            field,
            format!("division of {} by zero", a),
        ));
    }
    a.checked_div(b)
        .ok_or_else(|| ArithmeticInconsistencyError::new(phase, field, format!("{} ÷ {} overflows", a, b)))
}

/// Guards a field declared non-negative.
pub fn non_negative(
    phase: &'static str,
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ArithmeticInconsistencyError::new(
            phase,
            field,
            format!("expected a non-negative amount, got {}", value),
        ));
    }
    Ok(value)
}

/// `(1 + rate)^days`, compounding once per elapsed day.
pub fn compound_factor(
    phase: &'static str,
    field: &'static str,
    daily_rate: Decimal,
    days: u32,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    (Decimal::ONE + daily_rate)
        .checked_powu(u64::from(days))
        .ok_or_else(|| {
            ArithmeticInconsistencyError::new(
                phase,
                field,
                format!("(1 + {})^{} overflows", daily_rate, days),
            )
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
