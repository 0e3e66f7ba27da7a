//! # quote-core: Quote Pricing Calculation Engine
//!
//! This crate is the **heart** of the quotation CRM. It turns commercial
//! inputs (product costs, logistics terms, financing terms, customs/tax
//! parameters) into a fully priced, tax-compliant quotation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Quote Calculation Data Flow                         │
//! │                                                                         │
//! │  QuoteRequest ──► Normalizer ──► DerivedVariables + RuleFlags           │
//! │                                        │                                │
//! │                                        ▼                                │
//! │  AdminSettings ──────────────► Phase Pipeline (13 phases)               │
//! │  (AdminSettingsProvider)        │  1 purchase                           │
//! │                                 │  ── Allocator (multi-product) ──      │
//! │                                 │  2 logistics     8 ops financing      │
//! │                                 │  3 customs       9 agent commission   │
//! │                                 │  4 base COGS    10 final COGS         │
//! │                                 │  5 margin/fee   11 sale price         │
//! │                                 │  6 forex        12 VAT                │
//! │                                 │  7 supplier fin 13 settlement         │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                               CalculationResult                         │
//! │                    (per-product rows + quote-level totals)              │
//! │                                                                         │
//! │   NO I/O • NO DATABASE • NO NETWORK • NO GLOBAL STATE                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Request payload, enumerations, admin settings
//! - [`money`] - Decimal rounding policies (no floating point!)
//! - [`error`] - Typed failure reasons
//! - [`validation`] - Input normalizer (defaults + per-product overrides)
//! - [`derived`] - Derived variables and rule flags, resolved once
//! - [`allocation`] - Distribution keys and remainder-reconciled splitting
//! - [`financing`] - Daily compound interest over a dated cash-flow schedule
//! - [`phases`] - The 13 pricing phases
//! - [`result`] - Output rows under their legacy cell identifiers
//! - [`engine`] - Orchestrator and the admin settings provider seam
//!
//! ## Example Usage
//!
//! ```rust
//! use quote_core::engine::calculate_quote;
//! use quote_core::types::{AdminSettings, ProductInput, QuoteDefaults, QuoteRequest, DmFee};
//! use rust_decimal_macros::dec;
//!
//! let request = QuoteRequest {
//!     customer_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
//!     quote_date: None,
//!     quote_defaults: QuoteDefaults {
//!         currency_of_quote: "USD".into(),
//!         seller_company: "MASTER BEARING LLC".into(),
//!         seller_country: "russia".into(),
//!         incoterms: "DDP".into(),
//!         sale_type: "supply".into(),
//!         currency_of_base_price: "USD".into(),
//!         exchange_rate: dec!(1),
//!         supplier_discount: dec!(0),
//!         markup: dec!(0.15),
//!         vat_rate: dec!(0.20),
//!         dm_fee: DmFee::Fixed(dec!(0)),
//!         advance_from_client: dec!(1),
//!         advance_to_supplier: dec!(1),
//!         time_to_advance: 0,
//!         delivery_time: 30,
//!         time_to_advance_on_receiving: 0,
//!         logistics_supplier_hub: dec!(100),
//!         logistics_hub_customs: dec!(50),
//!         logistics_customs_client: dec!(25),
//!         brokerage_hub: dec!(0),
//!         brokerage_customs: dec!(0),
//!         warehousing_at_customs: dec!(0),
//!         customs_documentation: dec!(0),
//!         brokerage_extra: dec!(0),
//!         insurance_rate: dec!(0),
//!     },
//!     items: vec![ProductInput {
//!         quantity: 10,
//!         base_price: dec!(100),
//!         import_tariff: dec!(0.05),
//!         ..Default::default()
//!     }],
//! };
//! let settings = AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10);
//!
//! let result = calculate_quote(&request, &settings).unwrap();
//! assert_eq!(result.products.len(), 1);
//! assert!(result.totals.final_total_with_vat > dec!(0));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod derived;
pub mod engine;
pub mod error;
pub mod financing;
pub mod money;
pub mod phases;
pub mod result;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{calculate_quote, AdminSettingsProvider, ExecutionPath, QuoteCalculator};
pub use error::{
    ArithmeticInconsistencyError, CalcError, CalcResult, MissingAdminSettingsError,
    ValidationError, ValidationIssue,
};
pub use result::{CalculationResult, ProductResult, QuoteTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum product lines in one quote.
pub const MAX_QUOTE_ITEMS: usize = 1000;

/// Russian VAT, used when neither the quote nor the product sets a rate.
pub const DEFAULT_VAT_RATE: Decimal = dec!(0.20);
