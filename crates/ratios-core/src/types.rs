//! Core data types for financial-statement analysis.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`RawStatement`] - A raw statement table as returned by a provider
//! - [`StatementBundle`] - The three annual statements for one symbol
//! - [`Quote`] - Live price and market capitalization
//! - [`DividendPayment`] - A single dividend payment

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the date column every [`RawStatement`] is expected to carry.
pub const DATE_COLUMN: &str = "date";

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Which of the three financial statements a table represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Income statement.
    Income,
    /// Balance sheet.
    BalanceSheet,
    /// Cash-flow statement.
    CashFlow,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Income => "income statement",
            Self::BalanceSheet => "balance sheet",
            Self::CashFlow => "cash flow statement",
        };
        write!(f, "{name}")
    }
}

/// A raw financial statement table as fetched from a data provider.
///
/// The table carries a [`DATE_COLUMN`] with date-like row labels (which may
/// be unparseable strings) plus one column per reported line item (e.g.
/// `"Total Revenue"`, `"Net Income"`). Values may be missing, and line-item
/// labels vary between providers and filers; nothing about the table is
/// trusted until it has been normalized.
///
/// Raw statements are value types: once fetched (and possibly cached) they
/// are never mutated in place.
#[derive(Clone, Debug, Default)]
pub struct RawStatement {
    data: DataFrame,
}

impl RawStatement {
    /// Creates a raw statement from a provider DataFrame.
    #[must_use]
    pub const fn new(data: DataFrame) -> Self {
        Self { data }
    }

    /// Creates an empty raw statement (zero rows, zero columns).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a reference to the underlying DataFrame.
    #[must_use]
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    #[must_use]
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Returns the line-item column names (everything except the date column).
    #[must_use]
    pub fn line_items(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .filter(|name| name.as_str() != DATE_COLUMN)
            .map(|name| name.to_string())
            .collect()
    }

    /// Checks whether a line-item column is present.
    #[must_use]
    pub fn has_line_item(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|n| n.as_str() == name)
    }
}

impl From<DataFrame> for RawStatement {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}

impl AsRef<DataFrame> for RawStatement {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

/// The three annual statements for one symbol, as fetched in a single
/// provider round trip.
///
/// This is the unit of caching: a bundle is fetched once per ticker per
/// cache window and treated as immutable afterwards.
#[derive(Clone, Debug, Default)]
pub struct StatementBundle {
    /// Stock symbol the statements belong to.
    pub symbol: Symbol,
    /// Annual income statement.
    pub income: RawStatement,
    /// Annual balance sheet.
    pub balance: RawStatement,
    /// Annual cash-flow statement.
    pub cash_flow: RawStatement,
}

impl StatementBundle {
    /// Creates an empty bundle for a symbol.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            ..Default::default()
        }
    }

    /// Returns the raw statement of the given kind.
    #[must_use]
    pub const fn statement(&self, kind: StatementKind) -> &RawStatement {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::BalanceSheet => &self.balance,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }
}

/// A live market quote.
///
/// Either field may be absent; downstream consumers fall back to historical
/// bars for the price and to price × shares outstanding for the market cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price.
    pub last_price: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
}

impl Quote {
    /// Creates a quote with both fields set.
    #[must_use]
    pub const fn new(last_price: f64, market_cap: f64) -> Self {
        Self {
            last_price: Some(last_price),
            market_cap: Some(market_cap),
        }
    }
}

/// A single dividend payment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendPayment {
    /// Ex-dividend date.
    pub date: NaiveDate,
    /// Amount paid per share.
    pub amount: f64,
}

impl DividendPayment {
    /// Creates a new dividend payment.
    #[must_use]
    pub const fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_symbol_uppercased() {
        assert_eq!(Symbol::new("aapl").as_str(), "AAPL");
        assert_eq!("msft".parse::<Symbol>().unwrap().as_str(), "MSFT");
    }

    #[test]
    fn test_raw_statement_line_items() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec!["2023-12-31"]),
            Column::new("Total Revenue".into(), vec![1000.0]),
            Column::new("Net Income".into(), vec![100.0]),
        ])
        .unwrap();
        let stmt = RawStatement::new(df);

        assert_eq!(stmt.height(), 1);
        assert!(stmt.has_line_item("Total Revenue"));
        assert!(!stmt.has_line_item("date"));
        assert_eq!(stmt.line_items(), vec!["Total Revenue", "Net Income"]);
    }

    #[test]
    fn test_empty_statement() {
        let stmt = RawStatement::empty();
        assert!(stmt.is_empty());
        assert!(stmt.line_items().is_empty());
    }

    #[test]
    fn test_bundle_statement_lookup() {
        let bundle = StatementBundle::new(Symbol::new("AAPL"));
        assert!(bundle.statement(StatementKind::Income).is_empty());
        assert!(bundle.statement(StatementKind::BalanceSheet).is_empty());
        assert!(bundle.statement(StatementKind::CashFlow).is_empty());
    }
}
