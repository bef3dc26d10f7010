//! Cache trait for storing fetched statement data.
//!
//! This module defines the [`StatementCache`] trait: a keyed store for
//! statement bundles so repeated ratio requests within a bounded window do
//! not hit the network again.

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{StatementBundle, Symbol},
};

/// Trait for caching fetched statement bundles.
///
/// Entries are keyed by ticker symbol. How long an entry stays valid is a
/// property of the implementation, declared when the cache is constructed;
/// a stale entry must behave exactly like a miss. Cached bundles are value
/// types: implementations hand out clones and never mutate stored data.
#[async_trait]
pub trait StatementCache: Send + Sync {
    /// Retrieves the cached statement bundle for a symbol.
    ///
    /// Returns `Ok(Some(bundle))` on a fresh hit, `Ok(None)` if the symbol
    /// is not cached or the entry has outlived the cache's time-to-live.
    async fn get_statements(&self, symbol: &Symbol) -> Result<Option<StatementBundle>>;

    /// Stores a statement bundle in the cache.
    async fn put_statements(&self, symbol: &Symbol, bundle: &StatementBundle) -> Result<()>;

    /// Removes entries older than the cache's time-to-live.
    ///
    /// Returns the number of entries removed.
    async fn invalidate_stale(&self) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
