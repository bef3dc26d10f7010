//! Market-ratio block.
//!
//! Valuation metrics built from live market data plus the latest reported
//! statement values. This block sits at the boundary: its inputs come from
//! the market-data collaborator and may be partially or entirely absent,
//! and every metric degrades to missing on its own policy without touching
//! the statement ratio families.

use polars::prelude::DataFrame;

use ratios_core::{DividendPayment, Quote};

use crate::math::safe_div;
use crate::normalize::NormalizedStatement;
use crate::series::{EPS_ALIASES, SHARES_OUTSTANDING_ALIASES, TOTAL_EQUITY_ALIASES};

/// Number of trailing dividend payments summed into the "trailing 12m"
/// figure (the quarterly-payer convention).
const TRAILING_DIVIDEND_PAYMENTS: usize = 4;

/// Market data gathered from the collaborator for one symbol.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarketInputs {
    /// Live quote.
    pub quote: Quote,
    /// Last daily close, used when the quote carries no usable price.
    pub fallback_price: Option<f64>,
    /// Dividend payment history, ascending by date.
    pub dividends: Vec<DividendPayment>,
}

/// The computed market-ratio block: a fixed, ordered set of named metrics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarketRatios {
    /// Live (or last-close) price.
    pub price: Option<f64>,
    /// Market capitalization, falling back to price × shares outstanding.
    pub market_cap: Option<f64>,
    /// Earnings per share for the latest fiscal year.
    pub eps: Option<f64>,
    /// Price-to-earnings ratio. Missing when EPS is missing, zero, or
    /// negative: a loss-making year has no meaningful multiple.
    pub pe: Option<f64>,
    /// Book equity per share, from the latest reported balances.
    pub book_value_per_share: Option<f64>,
    /// Price-to-book ratio. Missing when book value per share is missing
    /// or exactly zero.
    pub pb: Option<f64>,
    /// Sum of the trailing dividend payments.
    pub trailing_dividends: Option<f64>,
    /// Trailing dividends over price.
    pub dividend_yield: Option<f64>,
}

impl MarketRatios {
    /// Returns the metrics as ordered name/value pairs, the shape the
    /// presentation layer renders.
    #[must_use]
    pub fn metrics(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("Price", self.price),
            ("Market Cap", self.market_cap),
            ("EPS (latest FY)", self.eps),
            ("P/E", self.pe),
            ("Book Value/Share", self.book_value_per_share),
            ("P/B", self.pb),
            ("Trailing 12m Dividends", self.trailing_dividends),
            ("Dividend Yield", self.dividend_yield),
        ]
    }
}

/// Computes the market-ratio block.
///
/// Pure: all fallible gathering happens before this call, and every absent
/// input degrades to a missing metric.
#[must_use]
pub fn compute_market_ratios(
    income: &NormalizedStatement,
    balance: &NormalizedStatement,
    inputs: &MarketInputs,
) -> MarketRatios {
    let price = inputs
        .quote
        .last_price
        .filter(|p| p.is_finite())
        .or(inputs.fallback_price);

    let shares = balance.series_any(SHARES_OUTSTANDING_ALIASES);
    let latest_shares = shares.latest().map(|(_, v)| v);

    let market_cap = inputs
        .quote
        .market_cap
        .filter(|m| m.is_finite())
        .or_else(|| Some(price? * latest_shares?));

    let eps = income
        .series_any(EPS_ALIASES)
        .latest()
        .map(|(_, v)| v);
    let pe = match eps {
        Some(e) if e > 0.0 => safe_div(price, eps),
        _ => None,
    };

    let book_equity = balance
        .series_any(TOTAL_EQUITY_ALIASES)
        .latest()
        .map(|(_, v)| v);
    let book_value_per_share = safe_div(book_equity, latest_shares);
    let pb = match book_value_per_share {
        Some(bvps) if bvps != 0.0 => safe_div(price, Some(bvps)),
        _ => None,
    };

    let trailing_dividends = if inputs.dividends.is_empty() {
        None
    } else {
        Some(
            inputs
                .dividends
                .iter()
                .rev()
                .take(TRAILING_DIVIDEND_PAYMENTS)
                .map(|d| d.amount)
                .sum(),
        )
    };
    let dividend_yield = safe_div(trailing_dividends, price);

    MarketRatios {
        price,
        market_cap,
        eps,
        pe,
        book_value_per_share,
        pb,
        trailing_dividends,
        dividend_yield,
    }
}

/// Extracts the most recent non-missing close from a daily bar frame.
#[must_use]
pub fn last_close(bars: &DataFrame) -> Option<f64> {
    let closes = bars.column("close").ok()?;
    let closes = closes.as_materialized_series().f64().ok()?;
    closes
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .next_back()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_statement;
    use chrono::NaiveDate;
    use polars::prelude::*;
    use ratios_core::RawStatement;

    fn statement(items: Vec<(&str, Vec<Option<f64>>)>) -> NormalizedStatement {
        let mut cols = vec![Column::new(
            "date".into(),
            vec!["2022-12-31", "2023-12-31"],
        )];
        for (name, values) in items {
            cols.push(Column::new(name.into(), values));
        }
        normalize_statement(&RawStatement::new(DataFrame::new(cols).unwrap()))
    }

    fn dividend(ymd: (i32, u32, u32), amount: f64) -> DividendPayment {
        DividendPayment::new(
            NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
            amount,
        )
    }

    #[test]
    fn test_negative_eps_means_no_pe() {
        let income = statement(vec![("Basic EPS", vec![Some(1.0), Some(-2.0)])]);
        let balance = statement(vec![]);
        let inputs = MarketInputs {
            quote: Quote {
                last_price: Some(100.0),
                market_cap: None,
            },
            ..Default::default()
        };

        let market = compute_market_ratios(&income, &balance, &inputs);
        assert_eq!(market.eps, Some(-2.0));
        assert_eq!(market.pe, None);
    }

    #[test]
    fn test_pe_from_latest_positive_eps() {
        let income = statement(vec![("Basic EPS", vec![Some(4.0), Some(5.0)])]);
        let balance = statement(vec![]);
        let inputs = MarketInputs {
            quote: Quote {
                last_price: Some(100.0),
                market_cap: None,
            },
            ..Default::default()
        };

        let market = compute_market_ratios(&income, &balance, &inputs);
        assert_eq!(market.pe, Some(20.0));
    }

    #[test]
    fn test_eps_alias_fallback_to_diluted() {
        let income = statement(vec![("Diluted EPS", vec![Some(2.0), Some(2.5)])]);
        let balance = statement(vec![]);
        let inputs = MarketInputs {
            quote: Quote {
                last_price: Some(50.0),
                market_cap: None,
            },
            ..Default::default()
        };

        let market = compute_market_ratios(&income, &balance, &inputs);
        assert_eq!(market.eps, Some(2.5));
        assert_eq!(market.pe, Some(20.0));
    }

    #[test]
    fn test_market_cap_falls_back_to_price_times_shares() {
        let income = statement(vec![]);
        let balance = statement(vec![("Share Issued", vec![Some(90.0), Some(100.0)])]);
        let inputs = MarketInputs {
            quote: Quote {
                last_price: Some(10.0),
                market_cap: None,
            },
            ..Default::default()
        };

        let market = compute_market_ratios(&income, &balance, &inputs);
        assert_eq!(market.market_cap, Some(1000.0));
    }

    #[test]
    fn test_book_value_and_pb() {
        let income = statement(vec![]);
        let balance = statement(vec![
            ("Total Stockholder Equity", vec![Some(900.0), Some(1000.0)]),
            ("Ordinary Shares Number", vec![Some(100.0), Some(100.0)]),
        ]);
        let inputs = MarketInputs {
            quote: Quote {
                last_price: Some(25.0),
                market_cap: None,
            },
            ..Default::default()
        };

        let market = compute_market_ratios(&income, &balance, &inputs);
        assert_eq!(market.book_value_per_share, Some(10.0));
        assert_eq!(market.pb, Some(2.5));
    }

    #[test]
    fn test_zero_shares_means_no_book_value() {
        let income = statement(vec![]);
        let balance = statement(vec![
            ("Total Equity", vec![Some(900.0), Some(1000.0)]),
            ("Share Issued", vec![Some(100.0), Some(0.0)]),
        ]);
        let inputs = MarketInputs::default();

        let market = compute_market_ratios(&income, &balance, &inputs);
        assert_eq!(market.book_value_per_share, None);
        assert_eq!(market.pb, None);
    }

    #[test]
    fn test_trailing_dividends_last_four_payments() {
        let income = statement(vec![]);
        let balance = statement(vec![]);
        let inputs = MarketInputs {
            quote: Quote {
                last_price: Some(100.0),
                market_cap: None,
            },
            fallback_price: None,
            dividends: vec![
                dividend((2024, 3, 1), 0.10),
                dividend((2024, 6, 1), 0.20),
                dividend((2024, 9, 1), 0.30),
                dividend((2024, 12, 1), 0.40),
                dividend((2025, 3, 1), 0.50),
            ],
        };

        let market = compute_market_ratios(&income, &balance, &inputs);
        // Last four payments: 0.20 + 0.30 + 0.40 + 0.50.
        assert!((market.trailing_dividends.unwrap() - 1.4).abs() < 1e-12);
        assert!((market.dividend_yield.unwrap() - 0.014).abs() < 1e-12);
    }

    #[test]
    fn test_no_dividend_history() {
        let market = compute_market_ratios(
            &statement(vec![]),
            &statement(vec![]),
            &MarketInputs::default(),
        );
        assert_eq!(market.trailing_dividends, None);
        assert_eq!(market.dividend_yield, None);
    }

    #[test]
    fn test_fallback_price_used_when_quote_empty() {
        let inputs = MarketInputs {
            quote: Quote::default(),
            fallback_price: Some(42.0),
            dividends: Vec::new(),
        };
        let market =
            compute_market_ratios(&statement(vec![]), &statement(vec![]), &inputs);
        assert_eq!(market.price, Some(42.0));
    }

    #[test]
    fn test_metrics_order() {
        let names: Vec<&str> = MarketRatios::default()
            .metrics()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Price",
                "Market Cap",
                "EPS (latest FY)",
                "P/E",
                "Book Value/Share",
                "P/B",
                "Trailing 12m Dividends",
                "Dividend Yield",
            ]
        );
    }

    #[test]
    fn test_last_close_skips_trailing_nulls() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec!["2025-08-01", "2025-08-04", "2025-08-05"]),
            Column::new("close".into(), vec![Some(99.0), Some(101.0), None]),
        ])
        .unwrap();
        assert_eq!(last_close(&df), Some(101.0));
        assert_eq!(last_close(&DataFrame::empty()), None);
    }
}
