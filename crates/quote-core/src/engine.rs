//! # Orchestrator
//!
//! Picks the execution path, runs the 13 phases in order and assembles the
//! [`CalculationResult`].
//!
//! ## Run Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QuoteCalculator::calculate(org, request)                               │
//! │    │                                                                    │
//! │    ├── normalize(request) ─────────────── ValidationError               │
//! │    ├── provider.admin_settings(org) ───── MissingAdminSettingsError     │
//! │    │                                       (no default-rate fallback)   │
//! │    └── run_pipeline (synchronous, no I/O)                              │
//! │          ├── derived variables + rule flags (once)                     │
//! │          ├── phase 1                                                    │
//! │          ├── allocation keys (once; key = 1 on the single path)        │
//! │          ├── phases 2–13 ──────────────── ArithmeticInconsistencyError  │
//! │          └── assemble rows + column sums                               │
//! │                                                                         │
//! │  Any error aborts the run. Nothing partial is returned.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The settings fetch is the only asynchronous step, and it sits behind the
//! [`AdminSettingsProvider`] trait so the pipeline can be tested without a
//! database.

use std::future::Future;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::allocation::AllocationKeys;
use crate::derived::{self, DerivedVariables};
use crate::error::{ArithmeticInconsistencyError, CalcError, CalcResult, MissingAdminSettingsError};
use crate::phases::{
    cogs, column, customs, financing, logistics, margin, pricing, purchase, reserves, settlement,
    vat, PhaseInputs,
};
use crate::result::{CalculationResult, ProductResult, QuoteTotals};
use crate::types::{AdminSettings, QuoteRequest};
use crate::validation::{normalize, NormalizedQuote};

// =============================================================================
// Admin Settings Provider
// =============================================================================

/// Source of an organization's admin rates.
///
/// Implemented by the settings database and by its TTL cache; tests use a
/// plain in-memory value.
pub trait AdminSettingsProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    fn admin_settings(
        &self,
        organization_id: &str,
    ) -> impl Future<Output = Result<AdminSettings, Self::Error>> + Send;
}

// =============================================================================
// Execution Path
// =============================================================================

/// Whether quote-level totals are split across products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPath {
    /// One product: key = 1, distribution is the identity.
    SingleProduct,
    /// Keys computed from purchase values after phase 1.
    MultiProduct,
}

impl ExecutionPath {
    pub fn for_product_count(count: usize) -> Self {
        if count == 1 {
            ExecutionPath::SingleProduct
        } else {
            ExecutionPath::MultiProduct
        }
    }
}

// =============================================================================
// Quote Calculator
// =============================================================================

/// Orchestrator bound to an admin settings provider.
///
/// ## Example
/// ```rust,ignore
/// let calculator = QuoteCalculator::new(CachedSettingsProvider::new(db, ttl));
/// let result = calculator.calculate("org-1", &request).await?;
/// println!("{}", result.totals.final_total_with_vat);
/// ```
#[derive(Debug, Clone)]
pub struct QuoteCalculator<P> {
    provider: P,
}

impl<P: AdminSettingsProvider> QuoteCalculator<P> {
    pub fn new(provider: P) -> Self {
        QuoteCalculator { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs one calculation for `organization_id`.
    ///
    /// Input is validated before the settings fetch, so a malformed request
    /// never costs a round trip.
    pub async fn calculate(
        &self,
        organization_id: &str,
        request: &QuoteRequest,
    ) -> CalcResult<CalculationResult> {
        let span = info_span!(
            "quote_calculation",
            organization = %organization_id,
            items = request.items.len(),
            run_id = %Uuid::new_v4(),
        );

        async {
            let normalized = normalize(request).map_err(|err| {
                warn!(error = %err, "Quote rejected by validation");
                CalcError::from(err)
            })?;

            let settings = self.fetch_settings(organization_id).await?;
            let path = ExecutionPath::for_product_count(normalized.products.len());

            let result = run_pipeline(&normalized, &settings, path).map_err(|err| {
                warn!(error = %err, "Calculation aborted");
                CalcError::from(err)
            })?;

            info!(
                customer = %normalized.customer_id,
                path = ?path,
                total = %result.totals.final_total_with_vat,
                "Quote calculated"
            );
            Ok::<_, CalcError>(result)
        }
        .instrument(span)
        .await
    }

    async fn fetch_settings(&self, organization_id: &str) -> Result<AdminSettings, MissingAdminSettingsError> {
        let settings = self
            .provider
            .admin_settings(organization_id)
            .await
            .map_err(|err| {
                warn!(error = %err, "Admin settings fetch failed");
                MissingAdminSettingsError {
                    organization_id: organization_id.to_string(),
                    reason: err.to_string(),
                }
            })?;

        check_settings(organization_id, &settings)?;
        Ok(settings)
    }
}

/// Organization reported when settings are passed in directly.
const DIRECT_SETTINGS: &str = "(supplied by caller)";

/// Out-of-range rates are as unusable as absent ones.
fn check_settings(organization_id: &str, settings: &AdminSettings) -> Result<(), MissingAdminSettingsError> {
    settings.validate().map_err(|err| {
        warn!(error = %err, "Admin settings out of range");
        MissingAdminSettingsError {
            organization_id: organization_id.to_string(),
            reason: err.to_string(),
        }
    })
}

/// Calculates a quote with settings already in hand.
///
/// ## Errors
/// - `CalcError::Validation` for malformed input
/// - `CalcError::MissingAdminSettings` for out-of-range settings, as with
///   [`QuoteCalculator::calculate`]
/// - `CalcError::Arithmetic` if a phase meets an impossible value
pub fn calculate_quote(request: &QuoteRequest, settings: &AdminSettings) -> CalcResult<CalculationResult> {
    let normalized = normalize(request)?;
    check_settings(DIRECT_SETTINGS, settings)?;

    let path = ExecutionPath::for_product_count(normalized.products.len());
    Ok(run_pipeline(&normalized, settings, path)?)
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs phases 1–13 over a normalized quote on the given path.
///
/// `MultiProduct` is valid for any product count, including one: the key is
/// then `S16 / S16 = 1`. `SingleProduct` requires exactly one product.
pub fn run_pipeline(
    quote: &NormalizedQuote,
    settings: &AdminSettings,
    path: ExecutionPath,
) -> Result<CalculationResult, ArithmeticInconsistencyError> {
    let derived = derived::resolve(quote, settings)?;
    debug!(flags = ?derived.flags, path = ?path, "Derived variables resolved");

    let bought = purchase::run(quote)?;

    let keys = match path {
        ExecutionPath::SingleProduct if quote.products.len() == 1 => AllocationKeys::single(),
        ExecutionPath::SingleProduct => {
            return Err(ArithmeticInconsistencyError::new(
                "allocation",
                "BD16",
                format!("single-product path given {} products", quote.products.len()),
            ))
        }
        ExecutionPath::MultiProduct => AllocationKeys::from_purchase_values(&bought.purchase_values())?,
    };

    let inputs = PhaseInputs {
        quote,
        derived: &derived,
        settings,
        keys: &keys,
    };

    let moved = logistics::run(&inputs, &bought)?;
    let cleared = customs::run(&inputs, &bought)?;
    let base_cogs = cogs::base(&inputs, &bought, &moved, &cleared)?;
    let marked_up = margin::run(&inputs, &bought, &base_cogs)?;
    let forex = reserves::forex(&inputs, &marked_up)?;
    let financed = financing::run(&inputs, &bought, &moved, &cleared, &marked_up)?;
    let commission = reserves::agent_commission(&inputs, &financed)?;
    let final_cogs = cogs::finalize(&inputs, &base_cogs, &forex, &financed, &commission)?;
    let priced = pricing::run(&inputs, &final_cogs, &marked_up)?;
    let taxed = vat::run(&inputs, &bought, &moved, &cleared, &priced)?;
    let settled = settlement::run(&inputs, &priced, &taxed)?;

    let phases = Phases {
        bought,
        moved,
        cleared,
        base_cogs,
        marked_up,
        forex,
        financed,
        commission,
        final_cogs,
        priced,
        taxed,
        settled,
    };
    let products = assemble_products(quote, &keys, &phases);
    let totals = assemble_totals(quote, &derived, &products, &phases)?;

    Ok(CalculationResult {
        currency: quote.terms.currency,
        incoterms: quote.terms.incoterms,
        deal: quote.terms.deal,
        flags: derived.flags,
        path,
        products,
        totals,
    })
}

// =============================================================================
// Assembly
// =============================================================================

struct Phases {
    bought: purchase::PurchasePhase,
    moved: logistics::LogisticsPhase,
    cleared: customs::CustomsPhase,
    base_cogs: cogs::CogsPhase,
    marked_up: margin::MarginPhase,
    forex: reserves::ReservePhase,
    financed: financing::FinancingPhase,
    commission: reserves::ReservePhase,
    final_cogs: cogs::CogsPhase,
    priced: pricing::PricingPhase,
    taxed: vat::VatPhase,
    settled: settlement::SettlementPhase,
}

fn assemble_products(quote: &NormalizedQuote, keys: &AllocationKeys, p: &Phases) -> Vec<ProductResult> {
    quote
        .products
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let bought = &p.bought.lines[i];
            let moved = &p.moved.lines[i];
            let cleared = &p.cleared.lines[i];
            let marked_up = &p.marked_up.lines[i];
            let priced = &p.priced.lines[i];
            let taxed = &p.taxed.lines[i];
            let settled = &p.settled.lines[i];

            ProductResult {
                index: product.index,
                sku: product.sku.clone(),
                name: product.name.clone(),
                quantity: product.quantity,
                ordered_quantity: bought.ordered_quantity,
                discounted_base_price: bought.discounted_price,
                purchase_price_per_unit: bought.unit_price,
                purchase_price_total: bought.purchase_value,
                distribution_key: keys.keys()[i],
                logistics: moved.logistics,
                brokerage: moved.brokerage,
                insurance: moved.insurance,
                customs_duty: cleared.duty,
                excise_tax: cleared.excise,
                cogs_base: p.base_cogs.lines[i].total,
                cogs_base_per_unit: p.base_cogs.lines[i].per_unit,
                markup: marked_up.markup,
                dm_fee: marked_up.dm_fee,
                sale_price_before_reserves: marked_up.sale_price,
                forex_reserve: p.forex.amounts[i],
                financing_cost: p.financed.allocated[i],
                agent_commission: p.commission.amounts[i],
                cogs_total: p.final_cogs.lines[i].total,
                cogs_per_unit: p.final_cogs.lines[i].per_unit,
                sale_price_total: priced.sale_total,
                sale_price_per_unit: priced.sale_per_unit,
                profit: priced.profit,
                output_vat: taxed.output_vat,
                input_vat_deductible: taxed.input_vat,
                import_vat_recharge: taxed.import_vat_recharge,
                net_vat_payable: settled.net_vat,
                final_price_total: settled.final_total,
                final_price_per_unit: settled.final_per_unit,
            }
        })
        .collect()
}

fn assemble_totals(
    quote: &NormalizedQuote,
    derived: &DerivedVariables,
    products: &[ProductResult],
    p: &Phases,
) -> Result<QuoteTotals, ArithmeticInconsistencyError> {
    let sum = |total: &'static str, field: fn(&ProductResult) -> Decimal| {
        column("assembly", total, products, field)
    };
    let financed = &p.financed;

    Ok(QuoteTotals {
        purchase_price_total: sum("S13", |r| r.purchase_price_total)?,
        logistics: sum("V13", |r| r.logistics)?,
        brokerage: sum("W13", |r| r.brokerage)?,
        insurance: sum("X13", |r| r.insurance)?,
        customs_duty: sum("Y13", |r| r.customs_duty)?,
        excise_tax: sum("Z13", |r| r.excise_tax)?,
        cogs_base: sum("AA13", |r| r.cogs_base)?,
        markup: sum("AC13", |r| r.markup)?,
        dm_fee: sum("AG13", |r| r.dm_fee)?,
        sale_price_before_reserves: sum("AD13", |r| r.sale_price_before_reserves)?,
        forex_reserve: sum("AH13", |r| r.forex_reserve)?,
        financing_cost: sum("BA13", |r| r.financing_cost)?,
        agent_commission: sum("AI13", |r| r.agent_commission)?,
        cogs_total: sum("AX13", |r| r.cogs_total)?,
        sale_price_total: sum("AK13", |r| r.sale_price_total)?,
        profit: sum("AF13", |r| r.profit)?,
        output_vat: sum("AN13", |r| r.output_vat)?,
        input_vat_deductible: sum("AO13", |r| r.input_vat_deductible)?,
        import_vat_recharge: sum("AQ13", |r| r.import_vat_recharge)?,
        net_vat_payable: sum("AP13", |r| r.net_vat_payable)?,
        final_total_with_vat: sum("AL13", |r| r.final_price_total)?,
        chargeable_weight: p.bought.chargeable_weight,
        logistics_supplier_hub: p.moved.supplier_hub,
        logistics_hub_customs: p.moved.hub_customs,
        logistics_customs_client: p.moved.customs_client,
        brokerage_total: p.moved.brokerage_total,
        financing_purchase_total: financed.purchase_total,
        client_advance: financed.client_advance,
        supplier_prepayment: financed.supplier_prepayment,
        supplier_remainder: financed.supplier_remainder,
        operational_costs: financed.operational_costs,
        financed_amount: financed.financed_amount,
        supplier_financing_cost: financed.supplier_financing_cost,
        operational_financing_cost: financed.operational_financing_cost,
        total_financing_cost: financed.total_financing_cost,
        final_payment_day: derived.final_payment_day,
        final_payment_date: quote
            .quote_date
            .and_then(|date| date.checked_add_signed(Duration::days(i64::from(derived.final_payment_day)))),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DmFee, ProductInput, QuoteDefaults};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(items: Vec<ProductInput>) -> QuoteRequest {
        QuoteRequest {
            customer_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            quote_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            quote_defaults: QuoteDefaults {
                currency_of_quote: "USD".into(),
                seller_company: "MASTER BEARING LLC".into(),
                seller_country: "russia".into(),
                incoterms: "DDP".into(),
                sale_type: "supply".into(),
                currency_of_base_price: "USD".into(),
                exchange_rate: dec!(1),
                supplier_discount: dec!(0),
                markup: dec!(0.10),
                vat_rate: dec!(0.20),
                dm_fee: DmFee::Fixed(dec!(50)),
                advance_from_client: dec!(0.5),
                advance_to_supplier: dec!(1),
                time_to_advance: 5,
                delivery_time: 30,
                time_to_advance_on_receiving: 10,
                logistics_supplier_hub: dec!(100),
                logistics_hub_customs: dec!(50),
                logistics_customs_client: dec!(25),
                brokerage_hub: dec!(10),
                brokerage_customs: dec!(0),
                warehousing_at_customs: dec!(0),
                customs_documentation: dec!(0),
                brokerage_extra: dec!(0),
                insurance_rate: dec!(0.001),
            },
            items,
        }
    }

    fn item(price: Decimal, quantity: i64) -> ProductInput {
        ProductInput {
            quantity,
            base_price: price,
            weight_in_kg: dec!(0.35),
            import_tariff: dec!(0.05),
            ..Default::default()
        }
    }

    fn settings() -> AdminSettings {
        AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10)
    }

    struct FixedProvider {
        settings: Option<AdminSettings>,
        calls: AtomicUsize,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("organization not configured")]
    struct NotConfigured;

    impl AdminSettingsProvider for FixedProvider {
        type Error = NotConfigured;

        async fn admin_settings(&self, _organization_id: &str) -> Result<AdminSettings, NotConfigured> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.settings.ok_or(NotConfigured)
        }
    }

    #[test]
    fn test_column_sums_match_rows() {
        let result = calculate_quote(
            &request(vec![item(dec!(100), 10), item(dec!(33.33), 7), item(dec!(5), 120)]),
            &settings(),
        )
        .unwrap();

        let logistics: Decimal = result.products.iter().map(|p| p.logistics).sum();
        assert_eq!(logistics, result.totals.logistics);
        assert_eq!(result.totals.logistics, dec!(175));
        assert_eq!(result.totals.financing_cost, result.totals.total_financing_cost);
        assert_eq!(result.totals.dm_fee, dec!(50));
        assert_eq!(result.path, ExecutionPath::MultiProduct);
    }

    #[test]
    fn test_row_identities_hold() {
        let result = calculate_quote(&request(vec![item(dec!(100), 10), item(dec!(40), 3)]), &settings()).unwrap();

        for row in &result.products {
            assert_eq!(
                row.cogs_base,
                row.purchase_price_total + row.logistics + row.brokerage + row.insurance + row.customs_duty + row.excise_tax
            );
            assert_eq!(
                row.cogs_total,
                row.cogs_base + row.forex_reserve + row.financing_cost + row.agent_commission
            );
            assert_eq!(row.sale_price_total, row.cogs_total + row.markup + row.dm_fee);
            assert_eq!(row.profit, row.sale_price_total - row.cogs_total);
            assert_eq!(row.net_vat_payable, row.output_vat - row.input_vat_deductible);
            assert_eq!(row.final_price_total, row.sale_price_total + row.output_vat);
        }
    }

    #[test]
    fn test_final_payment_date_and_weight() {
        let result = calculate_quote(&request(vec![item(dec!(100), 10)]), &settings()).unwrap();
        assert_eq!(result.totals.final_payment_day, 40);
        assert_eq!(result.totals.final_payment_date, NaiveDate::from_ymd_opt(2026, 4, 11));
        // 0.35 kg × 10 = 3.5 kg, charged as 4
        assert_eq!(result.totals.chargeable_weight, dec!(4));
    }

    #[test]
    fn test_lot_size_rounds_ordered_quantity() {
        let lots = ProductInput {
            lot_size: Some(25),
            ..item(dec!(2), 60)
        };
        let result = calculate_quote(&request(vec![lots]), &settings()).unwrap();
        assert_eq!(result.products[0].ordered_quantity, dec!(75));
        assert_eq!(result.products[0].purchase_price_total, dec!(150));
    }

    #[test]
    fn test_single_path_rejects_many_products() {
        let normalized = normalize(&request(vec![item(dec!(1), 1), item(dec!(2), 1)])).unwrap();
        let err = run_pipeline(&normalized, &settings(), ExecutionPath::SingleProduct).unwrap_err();
        assert_eq!(err.field, "BD16");
    }

    #[test]
    fn test_zero_value_quote_is_inconsistent_on_multi_path() {
        let err = calculate_quote(&request(vec![item(dec!(0), 1), item(dec!(0), 2)]), &settings()).unwrap_err();
        assert!(matches!(err, CalcError::Arithmetic(_)));
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let bad = AdminSettings::from_percent(dec!(300), dec!(2), dec!(0.069), 10);
        let err = calculate_quote(&request(vec![item(dec!(100), 1)]), &bad).unwrap_err();
        match err {
            CalcError::MissingAdminSettings(missing) => {
                assert_eq!(missing.organization_id, DIRECT_SETTINGS);
                assert!(missing.reason.contains("admin.forex_risk_rate"));
            }
            other => panic!("expected unusable settings, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_settings_fail_alike_on_both_entry_points() {
        let bad = AdminSettings::from_percent(dec!(300), dec!(2), dec!(0.069), 10);
        let calculator = QuoteCalculator::new(FixedProvider {
            settings: Some(bad),
            calls: AtomicUsize::new(0),
        });
        let req = request(vec![item(dec!(100), 1)]);

        let fetched = calculator.calculate("org-1", &req).await.unwrap_err();
        let direct = calculate_quote(&req, &bad).unwrap_err();
        match (fetched, direct) {
            (CalcError::MissingAdminSettings(fetched), CalcError::MissingAdminSettings(direct)) => {
                assert_eq!(fetched.organization_id, "org-1");
                assert_eq!(fetched.reason, direct.reason);
            }
            other => panic!("expected unusable settings from both, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_calculator_fetches_settings_once() {
        let calculator = QuoteCalculator::new(FixedProvider {
            settings: Some(settings()),
            calls: AtomicUsize::new(0),
        });
        let result = calculator
            .calculate("org-1", &request(vec![item(dec!(100), 10)]))
            .await
            .unwrap();
        assert_eq!(result.path, ExecutionPath::SingleProduct);
        assert_eq!(calculator.provider().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_settings_abort_the_run() {
        let calculator = QuoteCalculator::new(FixedProvider {
            settings: None,
            calls: AtomicUsize::new(0),
        });
        let err = calculator
            .calculate("org-404", &request(vec![item(dec!(100), 10)]))
            .await
            .unwrap_err();
        match err {
            CalcError::MissingAdminSettings(missing) => {
                assert_eq!(missing.organization_id, "org-404");
                assert_eq!(missing.reason, "organization not configured");
            }
            other => panic!("expected missing settings, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_skips_settings_fetch() {
        let calculator = QuoteCalculator::new(FixedProvider {
            settings: Some(settings()),
            calls: AtomicUsize::new(0),
        });
        let err = calculator.calculate("org-1", &request(vec![])).await.unwrap_err();
        assert!(matches!(err, CalcError::Validation(_)));
        assert_eq!(calculator.provider().calls.load(Ordering::SeqCst), 0);
    }
}
