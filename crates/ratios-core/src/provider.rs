//! Provider traits for fetching statement and market data.
//!
//! This module defines the collaborator boundary of the system:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`StatementProvider`] - Annual financial statements
//! - [`MarketDataProvider`] - Quotes, recent price bars, and dividends
//!
//! The ratio engine itself never performs I/O; everything it consumes
//! arrives through these traits.

use async_trait::async_trait;
use polars::prelude::DataFrame;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{DividendPayment, Quote, StatementBundle, Symbol},
};

/// Base trait for all data providers.
///
/// All data providers must implement this trait to provide basic metadata
/// about the provider.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for annual financial statements.
///
/// Implement this trait to supply the three raw statement tables for a
/// ticker. The tables carry a date-like row label column plus provider
/// specific line-item columns; no cleaning is expected of the provider
/// beyond shaping the response into a table.
#[async_trait]
pub trait StatementProvider: DataProvider {
    /// Fetches the annual income statement, balance sheet, and cash-flow
    /// statement for a symbol.
    ///
    /// A statement the provider has no data for is returned empty inside
    /// the bundle, not as an error; whether the absence is fatal is the
    /// caller's decision.
    async fn fetch_statements(&self, symbol: &Symbol) -> Result<StatementBundle>;
}

/// Provider for live market data.
///
/// Implement this trait to supply the inputs of the market-ratio block:
/// a live quote, recent daily bars as a price fallback, and the dividend
/// payment history.
#[async_trait]
pub trait MarketDataProvider: DataProvider {
    /// Fetches the current quote for a symbol.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote>;

    /// Fetches recent daily close bars for a symbol.
    ///
    /// Returns a DataFrame with columns: date, close. Used as a fallback
    /// when the live quote carries no usable price.
    async fn fetch_recent_bars(&self, symbol: &Symbol, days: u32) -> Result<DataFrame>;

    /// Fetches the dividend payment history for a symbol, sorted ascending
    /// by date.
    async fn fetch_dividends(&self, symbol: &Symbol) -> Result<Vec<DividendPayment>>;
}
