//! Property tests over randomly generated quotes.

mod common;

use common::{defaults, request, settings};
use proptest::prelude::*;
use quote_core::allocation::AllocationKeys;
use quote_core::engine::calculate_quote;
use quote_core::types::{Currency, ProductInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const INCOTERMS: [&str; 7] = ["DDP", "DAP", "CIF", "CPT", "FCA", "FOB", "EXW"];
const SALE_TYPES: [&str; 3] = ["supply", "export", "transit"];
const SELLERS: [&str; 2] = ["russia", "turkey"];

fn items() -> impl Strategy<Value = Vec<ProductInput>> {
    // prices from 1.00 so that every product carries a visible VAT amount
    prop::collection::vec((100i64..2_000_000, 1i64..500, 0u32..20), 1..8).prop_map(|rows| {
        rows.into_iter()
            .map(|(price_cents, quantity, tariff_pct)| ProductInput {
                quantity,
                base_price: Decimal::new(price_cents, 2),
                weight_in_kg: dec!(0.5),
                import_tariff: Decimal::new(i64::from(tariff_pct), 2),
                ..Default::default()
            })
            .collect()
    })
}

fn leg() -> impl Strategy<Value = Decimal> {
    (0i64..500_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_allocation_keys_sum_to_one(values in prop::collection::vec(1i64..10_000_000, 1..50)) {
        let values: Vec<Decimal> = values.into_iter().map(|cents| Decimal::new(cents, 2)).collect();
        let keys = AllocationKeys::from_purchase_values(&values).unwrap();
        let sum: Decimal = keys.keys().iter().sum();
        prop_assert!((sum - Decimal::ONE).abs() <= dec!(0.000000001), "keys sum to {}", sum);
    }

    #[test]
    fn prop_distribution_reconciles_exactly(
        values in prop::collection::vec(1i64..10_000_000, 1..50),
        total_mills in 0i64..100_000_000,
    ) {
        let values: Vec<Decimal> = values.into_iter().map(|cents| Decimal::new(cents, 2)).collect();
        let keys = AllocationKeys::from_purchase_values(&values).unwrap();
        let total = Decimal::new(total_mills, 3);

        let parts = keys.distribute(total, Currency::Usd);
        let sum: Decimal = parts.iter().sum();
        prop_assert_eq!(parts.len(), values.len());
        prop_assert_eq!(sum, total.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero));
    }

    #[test]
    fn prop_distributed_logistics_sum_to_quote_total(
        items in items(),
        legs in (leg(), leg(), leg()),
    ) {
        let mut terms = defaults();
        terms.logistics_supplier_hub = legs.0;
        terms.logistics_hub_customs = legs.1;
        terms.logistics_customs_client = legs.2;

        let result = calculate_quote(&request(terms, items), &settings()).unwrap();
        let distributed: Decimal = result.products.iter().map(|row| row.logistics).sum();
        prop_assert_eq!(distributed, legs.0 + legs.1 + legs.2);
        prop_assert_eq!(result.totals.logistics, distributed);

        let financing: Decimal = result.products.iter().map(|row| row.financing_cost).sum();
        prop_assert_eq!(financing, result.totals.total_financing_cost);
    }

    #[test]
    fn prop_input_vat_deductible_iff_ddp_and_not_export(
        items in items(),
        incoterms in prop::sample::select(INCOTERMS.to_vec()),
        sale_type in prop::sample::select(SALE_TYPES.to_vec()),
        seller in prop::sample::select(SELLERS.to_vec()),
    ) {
        let mut terms = defaults();
        terms.incoterms = incoterms.to_string();
        terms.sale_type = sale_type.to_string();
        terms.seller_country = seller.to_string();

        let result = calculate_quote(&request(terms, items), &settings()).unwrap();
        let deductible = incoterms == "DDP" && sale_type != "export";
        for row in &result.products {
            prop_assert_eq!(row.input_vat_deductible > Decimal::ZERO, deductible);
            if !deductible {
                prop_assert_eq!(row.input_vat_deductible, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn prop_runs_are_deterministic(items in items()) {
        let req = request(defaults(), items);
        let first = serde_json::to_string(&calculate_quote(&req, &settings()).unwrap()).unwrap();
        let second = serde_json::to_string(&calculate_quote(&req, &settings()).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }
}
