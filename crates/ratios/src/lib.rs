#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ratiolab/ratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial-statement ratio analysis over pluggable data providers.
//!
//! This crate re-exports the core types, the ratio engine, and the cache
//! implementations, and provides the [`RatioAnalyzer`] for end-to-end
//! analysis of a ticker.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance provider for statements and market data
//!
//! # Example
//!
//! ```rust,ignore
//! use ratios::{RatioAnalyzer, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> ratios::Result<()> {
//!     let analyzer = RatioAnalyzer::yahoo().with_default_cache();
//!
//!     let report = analyzer.analyze(&Symbol::new("AAPL")).await?;
//!     println!("{}", report.to_csv()?);
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use ratios_core::*;

// The ratio engine
pub use ratios_engine::{
    MarketInputs, MarketRatios, NormalizedStatement, RatioTable, StatementRatios, YearSeries,
    combined_table, compute_market_ratios, compute_ratios, normalize_statement,
};

// Cache implementations
pub use ratios_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "yahoo")]
pub use ratios_yahoo::YahooProvider;

mod analyzer;
pub use analyzer::{RatioAnalyzer, RatioReport};
