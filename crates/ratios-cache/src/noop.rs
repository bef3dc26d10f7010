//! No-op cache implementation.

use async_trait::async_trait;
use ratios_core::{Result, StatementBundle, StatementCache, Symbol};
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// All `get_*` methods return `Ok(None)` and all `put_*` methods return
/// `Ok(())`. Useful for disabling caching or testing code paths without
/// cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatementCache for NoopCache {
    async fn get_statements(&self, _symbol: &Symbol) -> Result<Option<StatementBundle>> {
        trace!("NoopCache: get_statements called, returning None");
        Ok(None)
    }

    async fn put_statements(&self, _symbol: &Symbol, _bundle: &StatementBundle) -> Result<()> {
        trace!("NoopCache: put_statements called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self) -> Result<usize> {
        trace!("NoopCache: invalidate_stale called, returning 0");
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopCache: clear called, doing nothing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_cache_get_returns_none() {
        let cache = NoopCache::new();
        let symbol = Symbol::new("AAPL");

        assert!(cache.get_statements(&symbol).await.unwrap().is_none());

        // A put is accepted but stored nowhere.
        let bundle = StatementBundle::new(symbol.clone());
        cache.put_statements(&symbol, &bundle).await.unwrap();
        assert!(cache.get_statements(&symbol).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_noop_cache_management() {
        let cache = NoopCache::new();

        assert_eq!(cache.invalidate_stale().await.unwrap(), 0);
        assert!(cache.clear().await.is_ok());
    }

    #[test]
    fn test_noop_cache_is_copy() {
        let cache1 = NoopCache::new();
        let cache2 = cache1; // Copy
        let _cache3 = cache2; // Still works because Copy
    }
}
