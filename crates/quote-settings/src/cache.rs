//! # Settings Cache
//!
//! Per-organization TTL cache in front of any [`AdminSettingsProvider`].
//!
//! ## Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  admin_settings(org)                                                   │
//! │       │                                                                 │
//! │       ├── entry younger than TTL ──► served, no fetch                  │
//! │       │                                                                 │
//! │       └── missing or expired ──────► inner.admin_settings(org)         │
//! │                 │                                                       │
//! │                 ├── Ok  ──► stored with a fresh timestamp, returned    │
//! │                 └── Err ──► returned as is                             │
//! │                             (an expired entry is NOT served instead:   │
//! │                              no stale or default fallback on failure)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time comes from `tokio::time`, so tests drive expiry with a paused clock.

use std::collections::HashMap;
use std::time::Duration;

use quote_core::engine::AdminSettingsProvider;
use quote_core::types::AdminSettings;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
struct CachedEntry {
    settings: AdminSettings,
    fetched_at: Instant,
}

/// TTL cache wrapping another provider.
#[derive(Debug)]
pub struct CachedSettingsProvider<P> {
    inner: P,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedEntry>>,
}

impl<P> CachedSettingsProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        CachedSettingsProvider {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops one organization's entry; the next lookup fetches.
    pub async fn invalidate(&self, organization_id: &str) {
        if self.entries.write().await.remove(organization_id).is_some() {
            debug!(organization = %organization_id, "Admin settings invalidated");
        }
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        info!(entries = entries.len(), "Admin settings cache cleared");
        entries.clear();
    }

    async fn fresh(&self, organization_id: &str) -> Option<AdminSettings> {
        let entries = self.entries.read().await;
        entries
            .get(organization_id)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.settings)
    }
}

impl<P> AdminSettingsProvider for CachedSettingsProvider<P>
where
    P: AdminSettingsProvider + Sync,
{
    type Error = P::Error;

    async fn admin_settings(&self, organization_id: &str) -> Result<AdminSettings, P::Error> {
        if let Some(settings) = self.fresh(organization_id).await {
            debug!(organization = %organization_id, "Admin settings cache hit");
            return Ok(settings);
        }

        debug!(organization = %organization_id, "Admin settings cache miss");
        let settings = match self.inner.admin_settings(organization_id).await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(organization = %organization_id, error = %err, "Admin settings fetch failed");
                return Err(err);
            }
        };

        self.entries.write().await.insert(
            organization_id.to_string(),
            CachedEntry {
                settings,
                fetched_at: Instant::now(),
            },
        );
        info!(organization = %organization_id, "Admin settings fetched");
        Ok(settings)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("settings store unreachable")]
    struct Unreachable;

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl AdminSettingsProvider for CountingProvider {
        type Error = Unreachable;

        async fn admin_settings(&self, _organization_id: &str) -> Result<AdminSettings, Unreachable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(Unreachable);
            }
            Ok(AdminSettings::from_percent(dec!(3), dec!(2), dec!(0.069), 10))
        }
    }

    fn cache() -> CachedSettingsProvider<CountingProvider> {
        CachedSettingsProvider::new(CountingProvider::default(), Duration::from_secs(60))
    }

    fn calls(cache: &CachedSettingsProvider<CountingProvider>) -> usize {
        cache.inner().calls.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_served_without_fetch() {
        let cache = cache();
        cache.admin_settings("org-1").await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        cache.admin_settings("org-1").await.unwrap();
        assert_eq!(calls(&cache), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetched() {
        let cache = cache();
        cache.admin_settings("org-1").await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.admin_settings("org-1").await.unwrap();
        assert_eq!(calls(&cache), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_organizations_cached_separately() {
        let cache = cache();
        cache.admin_settings("org-1").await.unwrap();
        cache.admin_settings("org-2").await.unwrap();
        cache.admin_settings("org-1").await.unwrap();
        assert_eq!(calls(&cache), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_not_masked_by_stale_entry() {
        let cache = cache();
        cache.admin_settings("org-1").await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.inner().failing.store(true, Ordering::SeqCst);

        assert!(cache.admin_settings("org-1").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_and_clear_force_fetch() {
        let cache = cache();
        cache.admin_settings("org-1").await.unwrap();
        cache.invalidate("org-1").await;
        cache.admin_settings("org-1").await.unwrap();
        assert_eq!(calls(&cache), 2);

        cache.clear().await;
        cache.admin_settings("org-1").await.unwrap();
        assert_eq!(calls(&cache), 3);
    }
}
