#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ratiolab/ratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for financial-statement ratio analysis.
//!
//! This crate provides the foundational abstractions of the workspace:
//!
//! - [`StatementProvider`](provider::StatementProvider) - Annual statement tables
//! - [`MarketDataProvider`](provider::MarketDataProvider) - Quotes, bars, dividends
//! - [`StatementCache`](cache::StatementCache) - Statement caching abstraction
//! - [`RawStatement`](types::RawStatement) / [`StatementBundle`](types::StatementBundle) -
//!   raw statement tables as they cross the provider boundary

/// Cache trait for storing fetched statement data.
pub mod cache;
/// Error types for data operations.
pub mod error;
/// Provider traits for fetching statement and market data.
pub mod provider;
/// Core data types (Symbol, RawStatement, Quote, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::StatementCache;
pub use error::{DataError, Result};
pub use provider::{DataProvider, MarketDataProvider, StatementProvider};
pub use types::{
    DATE_COLUMN, DividendPayment, Quote, RawStatement, StatementBundle, StatementKind, Symbol,
};
