//! # Validation Module (Input Normalizer)
//!
//! Validates the request and merges quote defaults with per-product
//! overrides into one fully resolved variable set per product.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Normalization Steps                                │
//! │                                                                         │
//! │  Step 1: Quote level                                                   │
//! │  ├── customer_id is a UUID                                             │
//! │  ├── categorical fields parse (currency, incoterms, sale type, seller) │
//! │  ├── rates in [0, 1], amounts ≥ 0                                      │
//! │  └── payment milestones are ordered                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Step 2: Each product (index reported on failure)                      │
//! │  ├── merge-with-override: Some(override) beats the quote default       │
//! │  ├── quantity > 0, price ≥ 0, exchange rate > 0                        │
//! │  └── rates in [0, 1]                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  NormalizedQuote (immutable for the rest of the run)                   │
//! │                                                                         │
//! │  The first failure is returned. No partial correction is attempted.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::derived::DealKind;
use crate::error::{ValidationError, ValidationIssue};
use crate::types::{
    Currency, DmFee, Incoterms, ProductInput, QuoteDefaults, QuoteRequest, SaleType, SellerCountry,
};
use crate::MAX_QUOTE_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Normalized Types
// =============================================================================

/// The validated request: quote terms plus one resolved set per product.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuote {
    pub customer_id: Uuid,
    pub quote_date: Option<NaiveDate>,
    pub terms: QuoteTerms,
    pub products: Vec<ResolvedProduct>,
}

/// Quote-wide terms after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTerms {
    pub currency: Currency,
    pub seller_company: String,
    pub incoterms: Incoterms,
    pub deal: DealKind,
    pub dm_fee: DmFee,

    pub advance_from_client: Decimal,
    pub advance_to_supplier: Decimal,
    pub time_to_advance: u32,
    pub delivery_time: u32,
    pub time_to_advance_on_receiving: u32,

    pub logistics_supplier_hub: Decimal,
    pub logistics_hub_customs: Decimal,
    pub logistics_customs_client: Decimal,

    pub brokerage_hub: Decimal,
    pub brokerage_customs: Decimal,
    pub warehousing_at_customs: Decimal,
    pub customs_documentation: Decimal,
    pub brokerage_extra: Decimal,

    pub insurance_rate: Decimal,
}

/// Every variable a phase may need for one product, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProduct {
    /// Position in the request's `items` list.
    pub index: usize,
    pub sku: Option<String>,
    pub name: Option<String>,

    pub quantity: i64,
    pub base_price: Decimal,
    pub weight_in_kg: Decimal,
    pub country_of_origin: String,
    pub customs_code: String,
    pub import_tariff: Decimal,
    pub excise_rate: Decimal,
    pub lot_size: Option<i64>,

    pub currency_of_base_price: Currency,
    pub exchange_rate: Decimal,
    pub supplier_discount: Decimal,
    pub markup: Decimal,
    pub vat_rate: Decimal,
}

impl ResolvedProduct {
    /// Quantity as a decimal for arithmetic.
    pub fn quantity_decimal(&self) -> Decimal {
        Decimal::from(self.quantity)
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Validates the request and resolves every product's variable set.
///
/// ## Example
/// ```rust,ignore
/// let normalized = normalize(&request)?;
/// assert_eq!(normalized.products.len(), request.items.len());
/// ```
pub fn normalize(request: &QuoteRequest) -> ValidationResult<NormalizedQuote> {
    let customer_id = validate_customer_id(&request.customer_id)?;

    if request.items.is_empty() {
        return Err(ValidationError::quote("items", ValidationIssue::Required));
    }
    if request.items.len() > MAX_QUOTE_ITEMS {
        return Err(ValidationError::quote(
            "items",
            ValidationIssue::TooMany {
                max: MAX_QUOTE_ITEMS,
            },
        ));
    }

    let defaults = &request.quote_defaults;
    let terms = normalize_terms(defaults)?;

    let products = request
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_product(index, item, defaults))
        .collect::<ValidationResult<Vec<_>>>()?;

    Ok(NormalizedQuote {
        customer_id,
        quote_date: request.quote_date,
        terms,
        products,
    })
}

fn normalize_terms(defaults: &QuoteDefaults) -> ValidationResult<QuoteTerms> {
    let currency = parse_quote::<Currency>("currency_of_quote", &defaults.currency_of_quote)?;
    let seller_country = parse_quote::<SellerCountry>("seller_country", &defaults.seller_country)?;
    let incoterms = parse_quote::<Incoterms>("incoterms", &defaults.incoterms)?;
    let sale_type = parse_quote::<SaleType>("sale_type", &defaults.sale_type)?;

    if defaults.seller_company.trim().is_empty() {
        return Err(ValidationError::quote("seller_company", ValidationIssue::Required));
    }

    let dm_fee = match defaults.dm_fee {
        DmFee::Fixed(amount) => DmFee::Fixed(amount_quote("dm_fee", amount)?),
        DmFee::Percent(rate) => DmFee::Percent(fraction_quote("dm_fee", rate)?),
    };

    let final_day = defaults
        .delivery_time
        .checked_add(defaults.time_to_advance_on_receiving)
        .ok_or_else(|| {
            ValidationError::quote(
                "time_to_advance_on_receiving",
                ValidationIssue::OutOfRange {
                    min: "0".to_string(),
                    max: u32::MAX.to_string(),
                },
            )
        })?;
    if defaults.time_to_advance > final_day {
        return Err(ValidationError::quote(
            "time_to_advance",
            ValidationIssue::OutOfRange {
                min: "0".to_string(),
                max: final_day.to_string(),
            },
        ));
    }

    Ok(QuoteTerms {
        currency,
        seller_company: defaults.seller_company.trim().to_string(),
        incoterms,
        deal: DealKind::new(sale_type, seller_country),
        dm_fee,
        advance_from_client: fraction_quote("advance_from_client", defaults.advance_from_client)?,
        advance_to_supplier: fraction_quote("advance_to_supplier", defaults.advance_to_supplier)?,
        time_to_advance: defaults.time_to_advance,
        delivery_time: defaults.delivery_time,
        time_to_advance_on_receiving: defaults.time_to_advance_on_receiving,
        logistics_supplier_hub: amount_quote("logistics_supplier_hub", defaults.logistics_supplier_hub)?,
        logistics_hub_customs: amount_quote("logistics_hub_customs", defaults.logistics_hub_customs)?,
        logistics_customs_client: amount_quote(
            "logistics_customs_client",
            defaults.logistics_customs_client,
        )?,
        brokerage_hub: amount_quote("brokerage_hub", defaults.brokerage_hub)?,
        brokerage_customs: amount_quote("brokerage_customs", defaults.brokerage_customs)?,
        warehousing_at_customs: amount_quote("warehousing_at_customs", defaults.warehousing_at_customs)?,
        customs_documentation: amount_quote("customs_documentation", defaults.customs_documentation)?,
        brokerage_extra: amount_quote("brokerage_extra", defaults.brokerage_extra)?,
        insurance_rate: fraction_quote("insurance_rate", defaults.insurance_rate)?,
    })
}

/// Merge-with-override for one product, then range checks.
fn resolve_product(
    index: usize,
    item: &ProductInput,
    defaults: &QuoteDefaults,
) -> ValidationResult<ResolvedProduct> {
    if item.quantity <= 0 {
        return Err(ValidationError::product(index, "quantity", ValidationIssue::MustBePositive));
    }
    if let Some(lot) = item.lot_size {
        if lot <= 0 {
            return Err(ValidationError::product(index, "lot_size", ValidationIssue::MustBePositive));
        }
    }

    let currency_text = item
        .currency_of_base_price
        .as_deref()
        .unwrap_or(&defaults.currency_of_base_price);
    let currency_of_base_price = currency_text
        .parse::<Currency>()
        .map_err(|issue| ValidationError::product(index, "currency_of_base_price", issue))?;

    let exchange_rate = item.exchange_rate.unwrap_or(defaults.exchange_rate);
    if exchange_rate <= Decimal::ZERO {
        return Err(ValidationError::product(
            index,
            "exchange_rate",
            ValidationIssue::MustBePositive,
        ));
    }

    Ok(ResolvedProduct {
        index,
        sku: item.sku.clone(),
        name: item.name.clone(),
        quantity: item.quantity,
        base_price: amount_product(index, "base_price", item.base_price)?,
        weight_in_kg: amount_product(index, "weight_in_kg", item.weight_in_kg)?,
        country_of_origin: item.country_of_origin.trim().to_string(),
        customs_code: item.customs_code.trim().to_string(),
        import_tariff: fraction_product(index, "import_tariff", item.import_tariff)?,
        excise_rate: fraction_product(index, "excise_rate", item.excise_rate)?,
        lot_size: item.lot_size,
        currency_of_base_price,
        exchange_rate,
        supplier_discount: fraction_product(
            index,
            "supplier_discount",
            item.supplier_discount.unwrap_or(defaults.supplier_discount),
        )?,
        markup: fraction_product(index, "markup", item.markup.unwrap_or(defaults.markup))?,
        vat_rate: fraction_product(index, "vat_rate", item.vat_rate.unwrap_or(defaults.vat_rate))?,
    })
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a customer id (UUID).
///
/// ## Example
/// ```rust
/// use quote_core::validation::validate_customer_id;
///
/// assert!(validate_customer_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_customer_id("not-a-uuid").is_err());
/// ```
pub fn validate_customer_id(id: &str) -> ValidationResult<Uuid> {
    if id.trim().is_empty() {
        return Err(ValidationError::quote("customer_id", ValidationIssue::Required));
    }

    Uuid::parse_str(id.trim()).map_err(|_| {
        ValidationError::quote(
            "customer_id",
            ValidationIssue::InvalidFormat {
                reason: "must be a valid UUID".to_string(),
            },
        )
    })
}

fn parse_quote<T>(field: &str, text: &str) -> ValidationResult<T>
where
    T: std::str::FromStr<Err = ValidationIssue>,
{
    if text.trim().is_empty() {
        return Err(ValidationError::quote(field, ValidationIssue::Required));
    }
    text.parse::<T>().map_err(|issue| ValidationError::quote(field, issue))
}

fn fraction_issue(value: Decimal) -> Option<ValidationIssue> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        Some(ValidationIssue::OutOfRange {
            min: "0".to_string(),
            max: "1".to_string(),
        })
    } else {
        None
    }
}

fn fraction_quote(field: &str, value: Decimal) -> ValidationResult<Decimal> {
    match fraction_issue(value) {
        Some(issue) => Err(ValidationError::quote(field, issue)),
        None => Ok(value),
    }
}

fn fraction_product(index: usize, field: &str, value: Decimal) -> ValidationResult<Decimal> {
    match fraction_issue(value) {
        Some(issue) => Err(ValidationError::product(index, field, issue)),
        None => Ok(value),
    }
}

fn amount_quote(field: &str, value: Decimal) -> ValidationResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(ValidationError::quote(field, ValidationIssue::Negative));
    }
    Ok(value)
}

fn amount_product(index: usize, field: &str, value: Decimal) -> ValidationResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(ValidationError::product(index, field, ValidationIssue::Negative));
    }
    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::DealKind;
    use rust_decimal_macros::dec;

    fn defaults() -> QuoteDefaults {
        QuoteDefaults {
            currency_of_quote: "USD".into(),
            seller_company: "MASTER BEARING LLC".into(),
            seller_country: "russia".into(),
            incoterms: "DDP".into(),
            sale_type: "supply".into(),
            currency_of_base_price: "EUR".into(),
            exchange_rate: dec!(0.92),
            supplier_discount: dec!(0.05),
            markup: dec!(0.15),
            vat_rate: dec!(0.20),
            dm_fee: DmFee::Fixed(dec!(0)),
            advance_from_client: dec!(0.5),
            advance_to_supplier: dec!(1),
            time_to_advance: 5,
            delivery_time: 30,
            time_to_advance_on_receiving: 10,
            logistics_supplier_hub: dec!(100),
            logistics_hub_customs: dec!(50),
            logistics_customs_client: dec!(25),
            brokerage_hub: dec!(0),
            brokerage_customs: dec!(0),
            warehousing_at_customs: dec!(0),
            customs_documentation: dec!(0),
            brokerage_extra: dec!(0),
            insurance_rate: dec!(0.001),
        }
    }

    fn request(items: Vec<ProductInput>) -> QuoteRequest {
        QuoteRequest {
            customer_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            quote_date: None,
            quote_defaults: defaults(),
            items,
        }
    }

    fn item() -> ProductInput {
        ProductInput {
            quantity: 10,
            base_price: dec!(100),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_apply_when_no_override() {
        let normalized = normalize(&request(vec![item()])).unwrap();
        let product = &normalized.products[0];
        assert_eq!(product.currency_of_base_price, Currency::Eur);
        assert_eq!(product.exchange_rate, dec!(0.92));
        assert_eq!(product.markup, dec!(0.15));
        assert_eq!(product.vat_rate, dec!(0.20));
    }

    #[test]
    fn test_override_applies_to_that_product_only() {
        let overridden = ProductInput {
            markup: Some(dec!(0.30)),
            currency_of_base_price: Some("CNY".into()),
            exchange_rate: Some(dec!(7.1)),
            ..item()
        };
        let normalized = normalize(&request(vec![item(), overridden])).unwrap();
        assert_eq!(normalized.products[0].markup, dec!(0.15));
        assert_eq!(normalized.products[1].markup, dec!(0.30));
        assert_eq!(normalized.products[1].currency_of_base_price, Currency::Cny);
        assert_eq!(normalized.products[0].currency_of_base_price, Currency::Eur);
    }

    #[test]
    fn test_deal_kind_resolved_once() {
        let normalized = normalize(&request(vec![item()])).unwrap();
        assert_eq!(
            normalized.terms.deal,
            DealKind::Domestic {
                seller: SellerCountry::Russia
            }
        );
    }

    #[test]
    fn test_quantity_must_be_positive_with_index() {
        let bad = ProductInput {
            quantity: 0,
            ..item()
        };
        let err = normalize(&request(vec![item(), bad])).unwrap_err();
        assert_eq!(err.field, "quantity");
        assert_eq!(err.product_index, Some(1));
        assert_eq!(err.issue, ValidationIssue::MustBePositive);
    }

    #[test]
    fn test_negative_price_rejected() {
        let bad = ProductInput {
            base_price: dec!(-1),
            ..item()
        };
        let err = normalize(&request(vec![bad])).unwrap_err();
        assert_eq!(err.field, "base_price");
        assert_eq!(err.product_index, Some(0));
    }

    #[test]
    fn test_integer_percent_rejected() {
        let bad = ProductInput {
            markup: Some(dec!(15)),
            ..item()
        };
        let err = normalize(&request(vec![bad])).unwrap_err();
        assert_eq!(err.field, "markup");
        assert!(matches!(err.issue, ValidationIssue::OutOfRange { .. }));
    }

    #[test]
    fn test_unknown_incoterms_rejected() {
        let mut req = request(vec![item()]);
        req.quote_defaults.incoterms = "XYZ".into();
        let err = normalize(&req).unwrap_err();
        assert_eq!(err.field, "incoterms");
        assert_eq!(err.product_index, None);
        assert!(matches!(err.issue, ValidationIssue::NotAllowed { .. }));
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = normalize(&request(vec![])).unwrap_err();
        assert_eq!(err.field, "items");
    }

    #[test]
    fn test_customer_id_must_be_uuid() {
        let mut req = request(vec![item()]);
        req.customer_id = "customer-42".into();
        let err = normalize(&req).unwrap_err();
        assert_eq!(err.field, "customer_id");
    }

    #[test]
    fn test_client_advance_after_final_payment_rejected() {
        let mut req = request(vec![item()]);
        req.quote_defaults.time_to_advance = 41;
        let err = normalize(&req).unwrap_err();
        assert_eq!(err.field, "time_to_advance");
    }

    #[test]
    fn test_zero_exchange_rate_rejected() {
        let bad = ProductInput {
            exchange_rate: Some(dec!(0)),
            ..item()
        };
        let err = normalize(&request(vec![bad])).unwrap_err();
        assert_eq!(err.field, "exchange_rate");
    }
}
