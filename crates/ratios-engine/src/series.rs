//! Year-indexed line-item series and extraction.
//!
//! [`YearSeries`] is the working representation of a single statement line
//! item: a fiscal-year → value map holding only valid numeric observations.
//! Extraction from a [`NormalizedStatement`] never fails (a missing column
//! or empty table yields an empty series), and concepts whose label varies
//! between data providers are resolved through ordered alias lists.

use std::collections::BTreeMap;

use crate::normalize::NormalizedStatement;

/// Alias labels for accounts receivable, in priority order.
pub const RECEIVABLES_ALIASES: &[&str] = &["Accounts Receivable", "Net Receivables"];

/// Alias labels for total equity, in priority order.
pub const TOTAL_EQUITY_ALIASES: &[&str] = &[
    "Total Equity Gross Minority Interest",
    "Total Equity",
    "Total Stockholder Equity",
];

/// Alias labels for shares outstanding, in priority order.
pub const SHARES_OUTSTANDING_ALIASES: &[&str] = &["Share Issued", "Ordinary Shares Number"];

/// Alias labels for earnings per share, in priority order.
pub const EPS_ALIASES: &[&str] = &["Basic EPS", "Diluted EPS"];

/// A single line item as a fiscal-year → value map.
///
/// Contains only years with a valid, finite numeric observation; iteration
/// order is ascending by year.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct YearSeries {
    points: BTreeMap<i32, f64>,
}

impl YearSeries {
    /// Creates an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the value for a fiscal year, if observed.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<f64> {
        self.points.get(&year).copied()
    }

    /// Returns the observed fiscal years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.keys().copied()
    }

    /// Returns the most recent observation as `(year, value)`.
    #[must_use]
    pub fn latest(&self) -> Option<(i32, f64)> {
        self.points.iter().next_back().map(|(&y, &v)| (y, v))
    }

    /// Re-indexes the series onto an aligned year index.
    ///
    /// Years the series lacks become missing slots; observations outside
    /// the index are dropped.
    #[must_use]
    pub fn reindex(&self, years: &[i32]) -> Vec<Option<f64>> {
        years.iter().map(|&y| self.get(y)).collect()
    }
}

impl FromIterator<(i32, f64)> for YearSeries {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().filter(|(_, v)| v.is_finite()).collect(),
        }
    }
}

impl NormalizedStatement {
    /// Extracts a line item as a [`YearSeries`].
    ///
    /// Missing column, empty table, or non-numeric values all degrade to an
    /// empty or partial series, never an error.
    #[must_use]
    pub fn series(&self, name: &str) -> YearSeries {
        match self.column(name) {
            Some(values) => self
                .years()
                .iter()
                .zip(values)
                .filter_map(|(&year, value)| value.map(|v| (year, v)))
                .collect(),
            None => YearSeries::new(),
        }
    }

    /// Extracts a concept that may appear under alternate labels.
    ///
    /// Tries each alias in priority order and returns the first one that
    /// yields a non-empty series; an empty series if none does.
    #[must_use]
    pub fn series_any(&self, aliases: &[&str]) -> YearSeries {
        for alias in aliases {
            let series = self.series(alias);
            if !series.is_empty() {
                return series;
            }
        }
        YearSeries::new()
    }
}
