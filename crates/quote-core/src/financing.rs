//! # Financing Model
//!
//! Daily compound interest over a dated cash-flow schedule.
//!
//! ## Schedule Walk
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  day 0            day time_to_advance    day delivery     day T_final  │
//! │    │                     │                    │                │       │
//! │  −prepayment         +client advance     −remainder         close      │
//! │                                                                         │
//! │  Between events:                                                       │
//! │    balance < 0  ⇒  balance × (1 + r)^elapsed_days   (debt compounds)  │
//! │    balance ≥ 0  ⇒  unchanged                        (no deposit yield) │
//! │                                                                         │
//! │  At an outflow, whatever the positive balance cannot cover is new     │
//! │  principal drawn. Interest = Σ growth of the debt while compounding.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whole days only. Interest is never approximated as `principal × r × days`.

use rust_decimal::Decimal;

use crate::error::ArithmeticInconsistencyError;
use crate::money;

/// One dated movement of money. Positive = received, negative = paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashFlow {
    pub day: u32,
    pub amount: Decimal,
}

impl CashFlow {
    pub fn inflow(day: u32, amount: Decimal) -> Self {
        CashFlow { day, amount }
    }

    pub fn outflow(day: u32, amount: Decimal) -> Self {
        CashFlow {
            day,
            amount: -amount,
        }
    }
}

/// What a schedule costs to carry until its closing day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accrual {
    /// Sum of the outflows that had to be borrowed.
    pub principal_drawn: Decimal,

    /// Debt outstanding on the closing day, interest included.
    pub closing_debt: Decimal,

    /// Interest accrued over the whole window, unrounded.
    pub interest: Decimal,
}

/// Walks `flows` in day order and compounds any debt daily until `close_day`.
///
/// Flows on the same day are applied in the order given. A flow dated after
/// `close_day` is an inconsistency.
pub fn accrue(
    phase: &'static str,
    field: &'static str,
    flows: &[CashFlow],
    close_day: u32,
    daily_rate: Decimal,
) -> Result<Accrual, ArithmeticInconsistencyError> {
    let mut ordered = flows.to_vec();
    ordered.sort_by_key(|flow| flow.day);

    let mut balance = Decimal::ZERO;
    let mut today = 0u32;
    let mut accrual = Accrual::default();

    for flow in &ordered {
        if flow.day > close_day {
            return Err(ArithmeticInconsistencyError::new(
                phase,
                field,
                format!("cash flow on day {} falls after closing day {}", flow.day, close_day),
            ));
        }

        balance = carry(phase, field, balance, flow.day - today, daily_rate, &mut accrual)?;
        today = flow.day;

        let debt_before = debt(balance);
        balance = money::add(phase, field, balance, flow.amount)?;
        let debt_after = debt(balance);
        if debt_after > debt_before {
            accrual.principal_drawn =
                money::add(phase, field, accrual.principal_drawn, debt_after - debt_before)?;
        }
    }

    balance = carry(phase, field, balance, close_day - today, daily_rate, &mut accrual)?;
    accrual.closing_debt = debt(balance);

    Ok(accrual)
}

/// Interest on a lump sum financed for `days`: `amount × ((1 + r)^days − 1)`.
pub fn lump_sum_interest(
    phase: &'static str,
    field: &'static str,
    amount: Decimal,
    days: u32,
    daily_rate: Decimal,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    let factor = money::compound_factor(phase, field, daily_rate, days)?;
    money::mul(phase, field, amount, factor - Decimal::ONE)
}

fn debt(balance: Decimal) -> Decimal {
    if balance < Decimal::ZERO {
        -balance
    } else {
        Decimal::ZERO
    }
}

fn carry(
    phase: &'static str,
    field: &'static str,
    balance: Decimal,
    days: u32,
    daily_rate: Decimal,
    accrual: &mut Accrual,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    if balance >= Decimal::ZERO || days == 0 {
        return Ok(balance);
    }
    let factor = money::compound_factor(phase, field, daily_rate, days)?;
    let carried = money::mul(phase, field, balance, factor)?;
    accrual.interest = money::add(phase, field, accrual.interest, balance - carried)?;
    Ok(carried)
}

// =============================================================================
// Unit Tests
// =============================================================================
