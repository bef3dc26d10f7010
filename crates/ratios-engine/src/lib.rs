#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ratiolab/ratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Statement normalization and financial-ratio computation.
//!
//! The pipeline, statement-in to tables-out:
//!
//! 1. [`normalize_statement`](normalize::normalize_statement) turns a raw
//!    provider table into a year-indexed [`NormalizedStatement`](normalize::NormalizedStatement);
//! 2. line items come out as [`YearSeries`](series::YearSeries), with alias
//!    fallback for provider-dependent labels;
//! 3. [`compute_ratios`](families::compute_ratios) derives the four ratio
//!    families over a common aligned year index using missing-value-safe
//!    arithmetic ([`math`]);
//! 4. [`compute_market_ratios`](market::compute_market_ratios) adds the
//!    optional valuation block from live market data.
//!
//! Every step is a pure transform; missing or malformed data degrades to
//! missing output values, never to an error or an infinity.

/// The four statement-ratio families.
pub mod families;
/// Missing-value-aware arithmetic over aligned series.
pub mod math;
/// Market-ratio block.
pub mod market;
/// Statement normalization.
pub mod normalize;
/// Year-indexed line-item series and extraction.
pub mod series;
/// Year-indexed ratio tables and the combined export format.
pub mod table;

// Re-export commonly used items at crate root
pub use families::{StatementRatios, compute_ratios};
pub use market::{MarketInputs, MarketRatios, compute_market_ratios, last_close};
pub use normalize::{NormalizedStatement, normalize_statement};
pub use series::{
    EPS_ALIASES, RECEIVABLES_ALIASES, SHARES_OUTSTANDING_ALIASES, TOTAL_EQUITY_ALIASES, YearSeries,
};
pub use table::{RatioTable, combined_table};
