//! # quote-settings: Admin Settings Provider
//!
//! Supplies each organization's forex-risk reserve, financial-agent
//! commission, daily loan rate and customs/logistics payment term to the
//! pricing engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QuoteCalculator (quote-core)                                          │
//! │       │ AdminSettingsProvider                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  quote-settings (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────────────┐     ┌───────────────────────────┐ │   │
//! │  │   │ CachedSettingsProvider │────►│ SettingsDb                │ │   │
//! │  │   │ (cache.rs, TTL)        │     │ (pool.rs + repository.rs) │ │   │
//! │  │   └────────────────────────┘     └─────────────┬─────────────┘ │   │
//! │  └────────────────────────────────────────────────┼───────────────┘   │
//! │                                                   ▼                    │
//! │                                   SQLite: admin_settings table         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quote_settings::{CachedSettingsProvider, SettingsDb, SettingsDbConfig};
//!
//! let db = SettingsDb::new(SettingsDbConfig::new("./quote-settings.db")).await?;
//! let provider = CachedSettingsProvider::new(db, Duration::from_secs(60));
//! let calculator = QuoteCalculator::new(provider);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::CachedSettingsProvider;
pub use error::{SettingsError, SettingsResult};
pub use pool::{SettingsDb, SettingsDbConfig};
pub use repository::{AdminSettingsRecord, AdminSettingsRepository};
