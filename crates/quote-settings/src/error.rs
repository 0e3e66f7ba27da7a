//! # Settings Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SettingsError (this module) ← Adds context and categorization         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MissingAdminSettingsError (quote-core) ← Calculation aborts           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Admin settings storage errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No settings row for the organization.
    #[error("No admin settings for organization {organization_id}")]
    NotFound { organization_id: String },

    /// A stored or submitted value cannot be used as a rate.
    ///
    /// ## When This Occurs
    /// - Non-decimal text in a percent column
    /// - Percent outside 0..=100
    /// - Payment term outside the u32 range
    #[error("Invalid {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl SettingsError {
    pub fn not_found(organization_id: impl Into<String>) -> Self {
        SettingsError::NotFound {
            organization_id: organization_id.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, value: impl ToString) -> Self {
        SettingsError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Convert sqlx errors to SettingsError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → SettingsError::QueryFailed
/// sqlx::Error::PoolTimedOut   → SettingsError::PoolExhausted
/// sqlx::Error::PoolClosed     → SettingsError::ConnectionFailed
/// Other                       → SettingsError::Internal
/// ```
///
/// `RowNotFound` never reaches here: lookups use `fetch_optional` and map a
/// missing row to `NotFound` with the organization id attached.
impl From<sqlx::Error> for SettingsError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => SettingsError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => SettingsError::PoolExhausted,
            sqlx::Error::PoolClosed => SettingsError::ConnectionFailed("Pool is closed".to_string()),
            _ => SettingsError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for SettingsError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SettingsError::MigrationFailed(err.to_string())
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SettingsError::not_found("org-7").to_string(),
            "No admin settings for organization org-7"
        );
        assert_eq!(
            SettingsError::invalid("forex_risk_pct", "abc").to_string(),
            "Invalid forex_risk_pct: 'abc'"
        );
    }

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        let err = SettingsError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, SettingsError::PoolExhausted));
    }
}
