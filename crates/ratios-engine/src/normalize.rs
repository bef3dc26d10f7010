//! Statement normalization.
//!
//! [`normalize_statement`] turns a [`RawStatement`] (a table with a
//! date-like row label column and arbitrary line-item columns) into a
//! [`NormalizedStatement`]: year-indexed, deduplicated, sorted ascending,
//! with every value coerced to `f64` or missing.

use chrono::{DateTime, Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use ratios_core::{DATE_COLUMN, RawStatement};

/// Days from 0001-01-01 (`num_days_from_ce` epoch) to 1970-01-01, the
/// physical epoch of polars Date values.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Date formats accepted for string row labels, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y",
];

/// A financial statement normalized onto an ascending fiscal-year index.
///
/// Every line-item column has exactly one value slot per year; a slot is
/// `None` when the filer did not report that item for that year or the
/// reported value was not numeric.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedStatement {
    years: Vec<i32>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl NormalizedStatement {
    /// Returns the ascending, duplicate-free fiscal-year index.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Returns true if the statement has no years at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Checks whether a line-item column is present.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the values of a line-item column, aligned to [`Self::years`].
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Returns the line-item column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Renders the statement as a DataFrame with a leading `year` column,
    /// for display and raw-data export.
    #[must_use]
    pub fn to_data_frame(&self) -> DataFrame {
        let mut cols = Vec::with_capacity(self.columns.len() + 1);
        cols.push(Column::new("year".into(), self.years.clone()));
        for (name, values) in &self.columns {
            cols.push(Column::new(name.as_str().into(), values.clone()));
        }
        DataFrame::new(cols).unwrap_or_default()
    }

    pub(crate) fn from_parts(
        years: Vec<i32>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Self {
        debug_assert!(columns.values().all(|v| v.len() == years.len()));
        Self { years, columns }
    }
}

/// Normalizes a raw statement onto a fiscal-year index.
///
/// - Rows whose date label cannot be parsed are discarded entirely.
/// - Duplicate fiscal years collapse to the chronologically latest row.
/// - The output is sorted ascending by year.
/// - Values that fail numeric coercion become missing.
/// - An empty or dateless input produces an empty statement, never an error.
///
/// Pure transform: already-normalized input passes through unchanged.
#[must_use]
pub fn normalize_statement(raw: &RawStatement) -> NormalizedStatement {
    let df = raw.data();
    if df.height() == 0 {
        return NormalizedStatement::default();
    }

    let Ok(date_col) = df.column(DATE_COLUMN) else {
        debug!("statement has no `{DATE_COLUMN}` column; treating as empty");
        return NormalizedStatement::default();
    };

    let dates = parse_date_column(date_col);

    // Keep parseable rows, in chronological order.
    let mut dated_rows: Vec<(NaiveDate, usize)> = dates
        .iter()
        .enumerate()
        .filter_map(|(row, date)| date.map(|d| (d, row)))
        .collect();
    dated_rows.sort_by_key(|&(date, _)| date);

    // Collapse duplicate fiscal years: the chronologically later row wins.
    // BTreeMap iteration gives the ascending year index for free.
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for (date, row) in dated_rows {
        by_year.insert(date.year(), row);
    }

    let years: Vec<i32> = by_year.keys().copied().collect();
    let picks: Vec<usize> = by_year.values().copied().collect();

    if years.is_empty() {
        return NormalizedStatement::default();
    }

    let mut columns = BTreeMap::new();
    for col in df.get_columns() {
        if col.name().as_str() == DATE_COLUMN {
            continue;
        }
        columns.insert(
            col.name().to_string(),
            coerce_numeric(col.as_materialized_series(), &picks),
        );
    }

    debug!(
        years = years.len(),
        line_items = columns.len(),
        "normalized statement"
    );

    NormalizedStatement::from_parts(years, columns)
}

/// Parses a raw date column into per-row dates.
///
/// Supports native Date columns and string columns in the formats of
/// [`DATE_FORMATS`] plus RFC 3339; anything else yields `None` for every row.
fn parse_date_column(column: &Column) -> Vec<Option<NaiveDate>> {
    if let Ok(dates) = column.date() {
        return dates
            .into_iter()
            .map(|days: Option<i32>| {
                days.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
            })
            .collect();
    }

    if let Ok(labels) = column.as_materialized_series().str() {
        return labels.into_iter().map(|s| s.and_then(parse_date_label)).collect();
    }

    vec![None; column.len()]
}

/// Parses a single date-like row label.
fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(label, format) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(label)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Coerces the picked rows of a line-item column to finite `f64` values.
fn coerce_numeric(series: &Series, picks: &[usize]) -> Vec<Option<f64>> {
    let Ok(casted) = series.cast(&DataType::Float64) else {
        return vec![None; picks.len()];
    };
    let Ok(values) = casted.f64() else {
        return vec![None; picks.len()];
    };
    picks
        .iter()
        .map(|&row| values.get(row).filter(|v| v.is_finite()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn raw(dates: Vec<&str>, revenue: Vec<Option<f64>>) -> RawStatement {
        RawStatement::new(
            DataFrame::new(vec![
                Column::new("date".into(), dates),
                Column::new("Total Revenue".into(), revenue),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let stmt = normalize_statement(&RawStatement::empty());
        assert!(stmt.is_empty());
        assert!(stmt.years().is_empty());
    }

    #[test]
    fn test_missing_date_column_is_empty_output() {
        let df = DataFrame::new(vec![Column::new("Total Revenue".into(), vec![1.0])]).unwrap();
        let stmt = normalize_statement(&RawStatement::new(df));
        assert!(stmt.is_empty());
    }

    #[test]
    fn test_unparseable_rows_are_discarded() {
        let stmt = normalize_statement(&raw(
            vec!["2022-12-31", "not a date", "2023-12-31"],
            vec![Some(100.0), Some(999.0), Some(120.0)],
        ));
        assert_eq!(stmt.years(), &[2022, 2023]);
        assert_eq!(
            stmt.column("Total Revenue").unwrap(),
            &[Some(100.0), Some(120.0)]
        );
    }

    #[test]
    fn test_sorted_ascending_with_unique_years() {
        let stmt = normalize_statement(&raw(
            vec!["2023-12-31", "2021-12-31", "2022-12-31"],
            vec![Some(3.0), Some(1.0), Some(2.0)],
        ));
        assert_eq!(stmt.years(), &[2021, 2022, 2023]);
        assert_eq!(
            stmt.column("Total Revenue").unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_duplicate_year_keeps_chronologically_later_row() {
        // A restated filing: same fiscal year, later date.
        let stmt = normalize_statement(&raw(
            vec!["2023-03-31", "2023-09-30"],
            vec![Some(100.0), Some(150.0)],
        ));
        assert_eq!(stmt.years(), &[2023]);
        assert_eq!(stmt.column("Total Revenue").unwrap(), &[Some(150.0)]);

        // Order of arrival must not matter.
        let stmt = normalize_statement(&raw(
            vec!["2023-09-30", "2023-03-31"],
            vec![Some(150.0), Some(100.0)],
        ));
        assert_eq!(stmt.column("Total Revenue").unwrap(), &[Some(150.0)]);
    }

    #[test]
    fn test_non_numeric_values_become_missing() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec!["2022-12-31", "2023-12-31"]),
            Column::new("Total Revenue".into(), vec!["1000", "n/a"]),
        ])
        .unwrap();
        let stmt = normalize_statement(&RawStatement::new(df));
        assert_eq!(
            stmt.column("Total Revenue").unwrap(),
            &[Some(1000.0), None]
        );
    }

    #[test]
    fn test_idempotent_on_clean_input() {
        let clean = raw(
            vec!["2021-12-31", "2022-12-31", "2023-12-31"],
            vec![Some(1.0), Some(2.0), Some(3.0)],
        );
        let once = normalize_statement(&clean);
        // Rebuild a raw table from the normalized data and normalize again.
        let again = normalize_statement(&raw(
            vec!["2021-12-31", "2022-12-31", "2023-12-31"],
            once.column("Total Revenue").unwrap().to_vec(),
        ));
        assert_eq!(once, again);
    }

    #[test]
    fn test_datetime_and_rfc3339_labels() {
        let stmt = normalize_statement(&raw(
            vec!["2022-12-31 00:00:00", "2023-12-31T00:00:00Z"],
            vec![Some(1.0), Some(2.0)],
        ));
        assert_eq!(stmt.years(), &[2022, 2023]);
    }

    #[test]
    fn test_native_date_column() {
        let days: Vec<i32> = vec![
            (NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()
                - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
            .num_days() as i32,
            (NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
                - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
            .num_days() as i32,
        ];
        let date_col = Column::new("date".into(), days)
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            date_col,
            Column::new("Net Income".into(), vec![10.0, 15.0]),
        ])
        .unwrap();

        let stmt = normalize_statement(&RawStatement::new(df));
        assert_eq!(stmt.years(), &[2022, 2023]);
        assert_eq!(stmt.column("Net Income").unwrap(), &[Some(10.0), Some(15.0)]);
    }

    #[test]
    fn test_to_data_frame_roundtrip_shape() {
        let stmt = normalize_statement(&raw(
            vec!["2022-12-31", "2023-12-31"],
            vec![Some(1.0), None],
        ));
        let df = stmt.to_data_frame();
        assert_eq!(df.height(), 2);
        assert!(df.column("year").is_ok());
        assert!(df.column("Total Revenue").is_ok());
    }
}
