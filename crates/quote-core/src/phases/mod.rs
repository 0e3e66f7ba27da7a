//! # Phase Pipeline
//!
//! Thirteen pure phases, executed in a fixed order.
//!
//! ## Dependency Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   1 purchase ─────────┬──────────────────────────────► allocation keys │
//! │                       ▼                                                 │
//! │   2 logistics   3 customs                                              │
//! │          └──────┬─────┘                                                 │
//! │                 ▼                                                       │
//! │   4 base COGS ──► 5 margin ──► 6 forex reserve                         │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │   7–8 financing ──► 9 agent commission                                 │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │   10 final COGS ──► 11 sale price ──► 12 VAT ──► 13 settlement         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each phase's `run` takes the shared [`PhaseInputs`] plus the outputs of
//! the earlier phases it reads, by reference. A phase cannot name an output
//! that has not been produced yet, so the order above is enforced by the
//! function signatures themselves. Outputs are never mutated after a phase
//! returns.

use rust_decimal::Decimal;

use crate::allocation::AllocationKeys;
use crate::derived::{DerivedVariables, RuleFlags};
use crate::error::ArithmeticInconsistencyError;
use crate::money::{self, finalize, RoundingPolicy};
use crate::types::{AdminSettings, Currency};
use crate::validation::NormalizedQuote;

pub mod cogs;
pub mod customs;
pub mod financing;
pub mod logistics;
pub mod margin;
pub mod pricing;
pub mod purchase;
pub mod reserves;
pub mod settlement;
pub mod vat;

/// Everything every phase may read besides earlier phase outputs.
#[derive(Debug, Clone, Copy)]
pub struct PhaseInputs<'a> {
    pub quote: &'a NormalizedQuote,
    pub derived: &'a DerivedVariables,
    pub settings: &'a AdminSettings,
    pub keys: &'a AllocationKeys,
}

impl<'a> PhaseInputs<'a> {
    pub fn currency(&self) -> Currency {
        self.quote.terms.currency
    }

    pub fn flags(&self) -> &RuleFlags {
        &self.derived.flags
    }

    /// Half-up to the quote currency's minor unit.
    pub fn round(&self, value: Decimal) -> Decimal {
        finalize(value, RoundingPolicy::HalfUpMinorUnit, self.currency())
    }

    /// Splits a quote-level total across products with the precomputed keys.
    pub fn distribute(&self, total: Decimal) -> Vec<Decimal> {
        self.keys.distribute(total, self.currency())
    }

    /// All-zero column, for add-ons a rule flag switches off.
    pub fn zeros(&self) -> Vec<Decimal> {
        vec![Decimal::ZERO; self.quote.products.len()]
    }
}

/// Sums one column of per-product lines into its row-13 total.
pub(crate) fn column<T>(
    phase: &'static str,
    total: &'static str,
    lines: &[T],
    field: impl Fn(&T) -> Decimal,
) -> Result<Decimal, ArithmeticInconsistencyError> {
    money::sum(phase, total, lines.iter().map(field))
}
