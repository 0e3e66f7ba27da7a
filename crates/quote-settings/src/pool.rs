//! # Settings Database
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SettingsDbConfig::new(path) ← Configure pool settings                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SettingsDb::new(config).await ← Create pool + run migrations          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CachedSettingsProvider::new(db, ttl) ← one fetch per org per TTL      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QuoteCalculator::new(provider)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use quote_core::engine::AdminSettingsProvider;
use quote_core::types::AdminSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};
use crate::migrations;
use crate::repository::AdminSettingsRepository;

const MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Settings database configuration.
///
/// ## Example
/// ```rust,ignore
/// let db = SettingsDb::new(SettingsDbConfig::new("./quote-settings.db")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SettingsDbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,
}

impl SettingsDbConfig {
    /// Creates a configuration for the given file; the file is created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsDbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// In-memory database for tests.
    pub fn in_memory() -> Self {
        SettingsDbConfig {
            database_path: PathBuf::from(MEMORY),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the admin settings store.
///
/// Implements [`AdminSettingsProvider`] directly; wrap it in
/// [`CachedSettingsProvider`](crate::CachedSettingsProvider) to avoid a query
/// per calculation.
#[derive(Debug, Clone)]
pub struct SettingsDb {
    pool: SqlitePool,
}

impl SettingsDb {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: SettingsDbConfig) -> SettingsResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing settings database"
        );

        let connect_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| SettingsError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                // Readers don't block writers, writers don't block readers
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true)
        };

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| SettingsError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Settings pool created");

        info!("Running database migrations");
        migrations::run_migrations(&pool).await?;
        info!("Migrations complete");

        Ok(SettingsDb { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn admin_settings_repo(&self) -> AdminSettingsRepository {
        AdminSettingsRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing settings database pool");
        self.pool.close().await;
    }
}

impl AdminSettingsProvider for SettingsDb {
    type Error = SettingsError;

    async fn admin_settings(&self, organization_id: &str) -> Result<AdminSettings, SettingsError> {
        self.admin_settings_repo().get(organization_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::AdminSettingsRecord;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated_on_open() {
        let db = SettingsDb::new(SettingsDbConfig::in_memory()).await.unwrap();
        assert!(db.admin_settings_repo().list().await.unwrap().is_empty());

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[test]
    fn test_config_defaults() {
        let config = SettingsDbConfig::new("/tmp/quote-settings.db");
        assert_eq!(config.max_connections, 5);
        assert!(!config.is_in_memory());

        let memory = SettingsDbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
    }

    #[tokio::test]
    async fn test_provider_reads_stored_rates() {
        let db = SettingsDb::new(SettingsDbConfig::in_memory()).await.unwrap();
        db.admin_settings_repo()
            .upsert(&AdminSettingsRecord {
                organization_id: "org-1".into(),
                forex_risk_pct: dec!(3),
                financial_agent_pct: dec!(2),
                daily_loan_pct: dec!(0.069),
                customs_logistics_pmt_due: 10,
            })
            .await
            .unwrap();

        let settings = db.admin_settings("org-1").await.unwrap();
        assert_eq!(settings, AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10));
    }

    #[tokio::test]
    async fn test_provider_unknown_organization() {
        let db = SettingsDb::new(SettingsDbConfig::in_memory()).await.unwrap();
        let err = db.admin_settings("org-404").await.unwrap_err();
        assert!(matches!(err, SettingsError::NotFound { .. }));
    }
}
