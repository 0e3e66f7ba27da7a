//! # Error Types
//!
//! Domain-specific error types for quote-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  quote-core errors (this file)                                         │
//! │  ├── ValidationError                - Normalizer rejected the input     │
//! │  ├── ArithmeticInconsistencyError   - A phase hit an impossible value   │
//! │  ├── MissingAdminSettingsError      - No rates for the organization     │
//! │  └── CalcError                      - Umbrella returned by the engine   │
//! │                                                                         │
//! │  quote-settings errors (separate crate)                                │
//! │  └── SettingsError  - Database / cache failures (mapped to Missing...) │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                              │
//! │        Arithmetic... ───┼──► CalcError ──► caller (UI / export layer)  │
//! │        MissingAdmin... ─┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are recovered inside the engine. A run either returns a
//! complete `CalculationResult` or one of these errors.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// What exactly was wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required field is missing or empty.
    Required,

    /// Value must be strictly greater than zero.
    MustBePositive,

    /// Value must not be negative.
    Negative,

    /// Value is outside an inclusive range.
    OutOfRange { min: String, max: String },

    /// Value is not in the allowed set.
    NotAllowed { allowed: Vec<String> },

    /// Invalid format (e.g., invalid UUID).
    InvalidFormat { reason: String },

    /// Collection has too many entries.
    TooMany { max: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Required => write!(f, "is required"),
            ValidationIssue::MustBePositive => write!(f, "must be positive"),
            ValidationIssue::Negative => write!(f, "must not be negative"),
            ValidationIssue::OutOfRange { min, max } => {
                write!(f, "must be between {} and {}", min, max)
            }
            ValidationIssue::NotAllowed { allowed } => write!(f, "must be one of: {:?}", allowed),
            ValidationIssue::InvalidFormat { reason } => write!(f, "has invalid format: {}", reason),
            ValidationIssue::TooMany { max } => write!(f, "must have at most {} entries", max),
        }
    }
}

/// Input validation failure detected by the normalizer.
///
/// Carries the offending field and, for per-product fields, the product's
/// position in the request's `items` list. Quote-level fields have no index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{field} {issue}", location(.product_index))]
pub struct ValidationError {
    pub field: String,
    pub product_index: Option<usize>,
    pub issue: ValidationIssue,
}

fn location(product_index: &Option<usize>) -> String {
    match product_index {
        Some(index) => format!("items[{}].", index),
        None => String::new(),
    }
}

impl ValidationError {
    /// Error on a quote-level field.
    pub fn quote(field: impl Into<String>, issue: ValidationIssue) -> Self {
        ValidationError {
            field: field.into(),
            product_index: None,
            issue,
        }
    }

    /// Error on a field of the product at `index`.
    pub fn product(index: usize, field: impl Into<String>, issue: ValidationIssue) -> Self {
        ValidationError {
            field: field.into(),
            product_index: Some(index),
            issue,
        }
    }
}

// =============================================================================
// Arithmetic Inconsistency
// =============================================================================

/// A phase detected a computation that cannot be right.
///
/// ## When This Occurs
/// - Division by a zero allocation base (all purchase values are zero)
/// - A field declared non-negative came out negative
/// - Decimal overflow in a checked operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Arithmetic inconsistency in {phase} ({field}): {detail}")]
pub struct ArithmeticInconsistencyError {
    pub phase: &'static str,
    pub field: &'static str,
    pub detail: String,
}

impl ArithmeticInconsistencyError {
    pub fn new(phase: &'static str, field: &'static str, detail: impl Into<String>) -> Self {
        ArithmeticInconsistencyError {
            phase,
            field,
            detail: detail.into(),
        }
    }
}

// =============================================================================
// Missing Admin Settings
// =============================================================================

/// The Admin Settings Provider could not supply rates.
///
/// Fatal: rates are regulatory/financial parameters, so there is no default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Admin settings unavailable for organization {organization_id}: {reason}")]
pub struct MissingAdminSettingsError {
    pub organization_id: String,
    pub reason: String,
}

// =============================================================================
// Calculation Error
// =============================================================================

/// Everything a calculation run can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticInconsistencyError),

    #[error(transparent)]
    MissingAdminSettings(#[from] MissingAdminSettingsError),
}

/// Convenience type alias for Results with CalcError.
pub type CalcResult<T> = Result<T, CalcError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::product(2, "quantity", ValidationIssue::MustBePositive);
        assert_eq!(err.to_string(), "items[2].quantity must be positive");

        let err = ValidationError::quote("customer_id", ValidationIssue::Required);
        assert_eq!(err.to_string(), "customer_id is required");

        let err = ValidationError::quote(
            "markup",
            ValidationIssue::OutOfRange {
                min: "0".to_string(),
                max: "1".to_string(),
            },
        );
        assert_eq!(err.to_string(), "markup must be between 0 and 1");
    }

    #[test]
    fn test_arithmetic_error_message() {
        let err = ArithmeticInconsistencyError::new("allocation", "BD16", "purchase base is zero");
        assert_eq!(
            err.to_string(),
            "Arithmetic inconsistency in allocation (BD16): purchase base is zero"
        );
    }

    #[test]
    fn test_errors_convert_to_calc_error() {
        let err: CalcError = ValidationError::quote("items", ValidationIssue::Required).into();
        assert!(matches!(err, CalcError::Validation(_)));

        let err: CalcError = MissingAdminSettingsError {
            organization_id: "org-1".to_string(),
            reason: "not found".to_string(),
        }
        .into();
        assert!(matches!(err, CalcError::MissingAdminSettings(_)));
    }
}
