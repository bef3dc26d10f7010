//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use ratios_core::{Result, StatementBundle, StatementCache, Symbol};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Default time-to-live for cached statement bundles.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry {
    bundle: StatementBundle,
    cached_at: chrono::DateTime<Utc>,
}

impl CacheEntry {
    fn new(bundle: StatementBundle) -> Self {
        Self {
            bundle,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// In-memory statement cache with a declared time-to-live.
///
/// Entries are keyed by ticker symbol and stored in a `RwLock`-protected
/// `HashMap`; bundles are cloned on get/put. An entry older than the TTL
/// behaves exactly like a miss, so the cache needs no background sweeping;
/// [`StatementCache::invalidate_stale`] merely reclaims the memory.
#[derive(Debug)]
pub struct InMemoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<Symbol, CacheEntry>>,
}

impl InMemoryCache {
    /// Creates a cache with the default 30-minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the declared time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatementCache for InMemoryCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get_statements(&self, symbol: &Symbol) -> Result<Option<StatementBundle>> {
        let entries = self.entries.read().await;
        match entries.get(symbol) {
            Some(entry) if !entry.is_stale(self.ttl) => {
                debug!("Cache hit for statements");
                Ok(Some(entry.bundle.clone()))
            }
            Some(_) => {
                debug!("Cache entry expired");
                Ok(None)
            }
            None => {
                debug!("Cache miss for statements");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, bundle), fields(symbol = %symbol))]
    async fn put_statements(&self, symbol: &Symbol, bundle: &StatementBundle) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(symbol.clone(), CacheEntry::new(bundle.clone()));
        debug!("Cached statement bundle");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - entries.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
