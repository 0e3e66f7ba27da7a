//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use quote_core::types::{AdminSettings, DmFee, ProductInput, QuoteDefaults, QuoteRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const CUSTOMER: &str = "550e8400-e29b-41d4-a716-446655440000";

/// A plain domestic DDP supply by the Russian entity.
pub fn defaults() -> QuoteDefaults {
    QuoteDefaults {
        currency_of_quote: "USD".into(),
        seller_company: "MASTER BEARING LLC".into(),
        seller_country: "russia".into(),
        incoterms: "DDP".into(),
        sale_type: "supply".into(),
        currency_of_base_price: "USD".into(),
        exchange_rate: dec!(1),
        supplier_discount: dec!(0),
        markup: dec!(0.15),
        vat_rate: dec!(0.20),
        dm_fee: DmFee::Fixed(dec!(0)),
        advance_from_client: dec!(0.3),
        advance_to_supplier: dec!(1),
        time_to_advance: 5,
        delivery_time: 45,
        time_to_advance_on_receiving: 15,
        logistics_supplier_hub: dec!(1200),
        logistics_hub_customs: dec!(400),
        logistics_customs_client: dec!(150),
        brokerage_hub: dec!(80),
        brokerage_customs: dec!(120),
        warehousing_at_customs: dec!(0),
        customs_documentation: dec!(35),
        brokerage_extra: dec!(0),
        insurance_rate: dec!(0.0005),
    }
}

pub fn request(defaults: QuoteDefaults, items: Vec<ProductInput>) -> QuoteRequest {
    QuoteRequest {
        customer_id: CUSTOMER.into(),
        quote_date: NaiveDate::from_ymd_opt(2026, 10, 1),
        quote_defaults: defaults,
        items,
    }
}

pub fn product(base_price: Decimal, quantity: i64) -> ProductInput {
    ProductInput {
        sku: Some(format!("SKF-{}", quantity)),
        name: Some("Deep groove ball bearing".into()),
        quantity,
        base_price,
        weight_in_kg: dec!(1.2),
        country_of_origin: "SE".into(),
        customs_code: "8482101009".into(),
        import_tariff: dec!(0.05),
        ..Default::default()
    }
}

pub fn settings() -> AdminSettings {
    AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10)
}
