//! Year-indexed ratio tables and the combined export format.

use std::collections::BTreeSet;

use ratios_core::{DataError, Result};

/// A table of named ratio columns over a shared ascending year index.
///
/// Columns keep their insertion order; values are `None` wherever a ratio
/// could not be computed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RatioTable {
    years: Vec<i32>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl RatioTable {
    /// Creates an empty table over the given year index.
    #[must_use]
    pub const fn new(years: Vec<i32>) -> Self {
        Self {
            years,
            columns: Vec::new(),
        }
    }

    /// Appends a ratio column.
    ///
    /// The column must have exactly one value slot per year.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.years.len());
        self.columns.push((name.into(), values));
    }

    /// Returns the ascending year index.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Returns true if the table has no years.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Returns the column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns a column's values, aligned to [`Self::years`].
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Returns a single ratio value.
    #[must_use]
    pub fn get(&self, year: i32, name: &str) -> Option<f64> {
        let row = self.years.iter().position(|&y| y == year)?;
        self.column(name)?.get(row).copied().flatten()
    }

    /// Restricts the table to years in `start..=end`.
    #[must_use]
    pub fn between(&self, start: i32, end: i32) -> Self {
        let keep: Vec<usize> = self
            .years
            .iter()
            .enumerate()
            .filter(|&(_, &y)| (start..=end).contains(&y))
            .map(|(i, _)| i)
            .collect();

        Self {
            years: keep.iter().map(|&i| self.years[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| {
                    (name.clone(), keep.iter().map(|&i| values[i]).collect())
                })
                .collect(),
        }
    }

    /// Serializes the table as comma-separated values.
    ///
    /// Header row first, the year as the leading column, missing values as
    /// empty cells.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["Year".to_string()];
        header.extend(self.column_names().map(String::from));
        writer
            .write_record(&header)
            .map_err(|e| DataError::Other(e.to_string()))?;

        for (row, year) in self.years.iter().enumerate() {
            let mut record = vec![year.to_string()];
            for (_, values) in &self.columns {
                record.push(values[row].map(|v| v.to_string()).unwrap_or_default());
            }
            writer
                .write_record(&record)
                .map_err(|e| DataError::Other(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DataError::Other(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DataError::Other(e.to_string()))
    }
}

/// Joins family tables into a single export table.
///
/// The output index is the sorted union of the input indexes; every column
/// is prefixed with its family name (`"Profitability: ROA"`), and a family
/// lacking a year contributes missing values for it.
#[must_use]
pub fn combined_table(families: &[(&str, &RatioTable)]) -> RatioTable {
    let years: Vec<i32> = families
        .iter()
        .flat_map(|(_, table)| table.years().iter().copied())
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .collect();

    let mut combined = RatioTable::new(years.clone());
    for (family, table) in families {
        for name in table.column_names() {
            let values = years
                .iter()
                .map(|&year| table.get(year, name))
                .collect();
            combined.push_column(format!("{family}: {name}"), values);
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RatioTable {
        let mut table = RatioTable::new(vec![2021, 2022, 2023]);
        table.push_column("Current Ratio", vec![Some(1.5), Some(2.0), None]);
        table.push_column("Quick Ratio", vec![None, Some(1.6), Some(1.7)]);
        table
    }

    #[test]
    fn test_get_by_year_and_name() {
        let table = sample();
        assert_eq!(table.get(2022, "Current Ratio"), Some(2.0));
        assert_eq!(table.get(2023, "Current Ratio"), None);
        assert_eq!(table.get(2019, "Current Ratio"), None);
        assert_eq!(table.get(2022, "No Such Ratio"), None);
    }

    #[test]
    fn test_between_restricts_years() {
        let table = sample().between(2022, 2023);
        assert_eq!(table.years(), &[2022, 2023]);
        assert_eq!(table.column("Current Ratio").unwrap(), &[Some(2.0), None]);
    }

    #[test]
    fn test_csv_header_and_missing_cells() {
        let csv = sample().to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Year,Current Ratio,Quick Ratio");
        assert_eq!(lines.next().unwrap(), "2021,1.5,");
        assert_eq!(lines.next().unwrap(), "2022,2,1.6");
        assert_eq!(lines.next().unwrap(), "2023,,1.7");
    }

    #[test]
    fn test_combined_prefixes_and_outer_join() {
        let mut profitability = RatioTable::new(vec![2022, 2023]);
        profitability.push_column("ROA", vec![Some(0.05), Some(0.07)]);

        let mut liquidity = RatioTable::new(vec![2021, 2022]);
        liquidity.push_column("Current Ratio", vec![Some(1.2), Some(1.4)]);

        let combined = combined_table(&[
            ("Profitability", &profitability),
            ("Liquidity", &liquidity),
        ]);

        assert_eq!(combined.years(), &[2021, 2022, 2023]);
        assert_eq!(
            combined.column_names().collect::<Vec<_>>(),
            vec!["Profitability: ROA", "Liquidity: Current Ratio"]
        );
        assert_eq!(combined.get(2021, "Profitability: ROA"), None);
        assert_eq!(combined.get(2023, "Liquidity: Current Ratio"), None);
        assert_eq!(combined.get(2022, "Liquidity: Current Ratio"), Some(1.4));
    }
}
