#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ratiolab/ratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance data provider.
//!
//! This crate provides a Yahoo Finance data provider that implements the
//! [`StatementProvider`] and [`MarketDataProvider`] traits from
//! `ratios-core`.
//!
//! # Features
//!
//! - Annual income statement, balance sheet, and cash-flow tables from the
//!   fundamentals-timeseries API, with line items labelled the way the
//!   ratio engine expects them
//! - Live quote (price, market cap) from the quote summary API
//! - Recent daily bars and dividend events from the chart API
//! - Built-in rate limiting (1 request per second by default)
//!
//! # Example
//!
//! ```no_run
//! use ratios_yahoo::YahooProvider;
//! use ratios_core::{StatementProvider, Symbol};
//!
//! # async fn example() -> ratios_core::Result<()> {
//! let provider = YahooProvider::new();
//! let symbol = Symbol::new("AAPL");
//!
//! let bundle = provider.fetch_statements(&symbol).await?;
//! println!("income statement rows: {}", bundle.income.height());
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use polars::prelude::*;
use ratios_core::{
    DATE_COLUMN, DataError, DataProvider, DividendPayment, MarketDataProvider, Quote, RawStatement,
    Result, StatementBundle, StatementKind, StatementProvider, Symbol,
};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::debug;

/// Yahoo Finance fundamentals-timeseries API base URL.
const TIMESERIES_API_URL: &str =
    "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Years of annual statement history requested.
const STATEMENT_LOOKBACK_YEARS: i64 = 10;

/// Days of dividend history requested (covers the trailing four quarterly
/// payments with slack).
const DIVIDEND_LOOKBACK_DAYS: i64 = 730;

/// Income-statement timeseries keys and the line-item labels they map to.
const INCOME_ITEMS: &[(&str, &str)] = &[
    ("annualTotalRevenue", "Total Revenue"),
    ("annualCostOfRevenue", "Cost Of Revenue"),
    ("annualGrossProfit", "Gross Profit"),
    ("annualEBIT", "EBIT"),
    ("annualInterestExpense", "Interest Expense"),
    ("annualNetIncome", "Net Income"),
    ("annualBasicEPS", "Basic EPS"),
    ("annualDilutedEPS", "Diluted EPS"),
];

/// Balance-sheet timeseries keys and the line-item labels they map to.
const BALANCE_ITEMS: &[(&str, &str)] = &[
    ("annualCurrentAssets", "Current Assets"),
    ("annualCurrentLiabilities", "Current Liabilities"),
    (
        "annualCashCashEquivalentsAndShortTermInvestments",
        "Cash Cash Equivalents And Short Term Investments",
    ),
    ("annualInventory", "Inventory"),
    ("annualAccountsReceivable", "Accounts Receivable"),
    ("annualAccountsPayable", "Accounts Payable"),
    ("annualTotalAssets", "Total Assets"),
    ("annualTotalDebt", "Total Debt"),
    (
        "annualTotalEquityGrossMinorityInterest",
        "Total Equity Gross Minority Interest",
    ),
    ("annualStockholdersEquity", "Total Stockholder Equity"),
    ("annualShareIssued", "Share Issued"),
    ("annualOrdinarySharesNumber", "Ordinary Shares Number"),
];

/// Cash-flow timeseries keys and the line-item labels they map to.
const CASH_FLOW_ITEMS: &[(&str, &str)] = &[
    ("annualOperatingCashFlow", "Operating Cash Flow"),
    ("annualInvestingCashFlow", "Investing Cash Flow"),
    ("annualFinancingCashFlow", "Financing Cash Flow"),
    ("annualCapitalExpenditure", "Capital Expenditure"),
    ("annualFreeCashFlow", "Free Cash Flow"),
];

/// Yahoo Finance data provider.
///
/// Implements [`StatementProvider`] and [`MarketDataProvider`].
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Uses the provided client for all HTTP requests. Rate limiting
    /// is still applied.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    /// Make a rate-limited GET request and parse the JSON response.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        symbol: &Symbol,
    ) -> Result<T> {
        self.apply_rate_limit().await;
        debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataError::Parse(e.to_string()))
    }

    /// Build the fundamentals-timeseries URL for a set of item keys.
    fn build_timeseries_url(&self, symbol: &Symbol, keys: &[&str]) -> String {
        let end = Utc::now();
        let start = end - chrono::Duration::days(STATEMENT_LOOKBACK_YEARS * 366);

        format!(
            "{}/{}?symbol={}&type={}&period1={}&period2={}",
            TIMESERIES_API_URL,
            symbol.as_str(),
            symbol.as_str(),
            keys.join(","),
            start.timestamp(),
            end.timestamp()
        )
    }

    /// Build the chart API URL for recent daily bars.
    fn build_chart_url(&self, symbol: &Symbol, days_back: i64, with_dividends: bool) -> String {
        let end = Utc::now();
        let start = end - chrono::Duration::days(days_back);
        let events = if with_dividends { "&events=div" } else { "" };

        format!(
            "{}/{}?period1={}&period2={}&interval=1d{}",
            CHART_API_URL,
            symbol.as_str(),
            start.timestamp(),
            end.timestamp(),
            events
        )
    }

    /// Fetch one statement table from the fundamentals-timeseries API.
    async fn fetch_timeseries(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        items: &[(&str, &str)],
    ) -> Result<RawStatement> {
        let keys: Vec<&str> = items.iter().map(|(key, _)| *key).collect();
        let url = self.build_timeseries_url(symbol, &keys);

        let response: TimeseriesResponse = self.get_json(&url, symbol).await?;

        if let Some(error) = response.timeseries.error {
            return Err(DataError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let statement = assemble_statement(items, &response);
        debug!(
            %symbol,
            statement = %kind,
            rows = statement.height(),
            "fetched statement"
        );
        Ok(statement)
    }

    /// Parse Yahoo Finance chart response into a daily-close DataFrame.
    fn parse_chart_bars(&self, symbol: &Symbol, response: ChartResponse) -> Result<DataFrame> {
        let result = response
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Parse("Missing quote data".to_string()))?;

        // Convert timestamps to dates (days since the Unix epoch).
        let dates: Vec<i32> = timestamps
            .iter()
            .map(|&ts| {
                Utc.timestamp_opt(ts, 0)
                    .single()
                    .map(|dt| dt.date_naive())
                    .unwrap_or_else(|| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
            })
            .map(|d| (d - chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32)
            .collect();

        let closes: Vec<Option<f64>> = quote.close;

        let date_col = Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Other(e.to_string()))?;

        let df = DataFrame::new(vec![date_col, Column::new("close".into(), closes)])
            .map_err(|e| DataError::Other(e.to_string()))?;

        let df = df
            .lazy()
            .sort(["date"], Default::default())
            .collect()
            .map_err(|e| DataError::Other(e.to_string()))?;

        Ok(df)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance data provider for annual statements, quotes, and dividends"
    }
}

#[async_trait]
impl StatementProvider for YahooProvider {
    async fn fetch_statements(&self, symbol: &Symbol) -> Result<StatementBundle> {
        let income = self
            .fetch_timeseries(symbol, StatementKind::Income, INCOME_ITEMS)
            .await?;
        let balance = self
            .fetch_timeseries(symbol, StatementKind::BalanceSheet, BALANCE_ITEMS)
            .await?;
        let cash_flow = self
            .fetch_timeseries(symbol, StatementKind::CashFlow, CASH_FLOW_ITEMS)
            .await?;

        Ok(StatementBundle {
            symbol: symbol.clone(),
            income,
            balance,
            cash_flow,
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
        let url = format!("{}/{}?modules=price", QUOTE_SUMMARY_URL, symbol.as_str());
        let response: QuoteSummaryResponse = self.get_json(&url, symbol).await?;

        let result = response
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

        let price = result.price.unwrap_or_default();

        Ok(Quote {
            last_price: price.regular_market_price.and_then(|v| v.raw),
            market_cap: price.market_cap.and_then(|v| v.raw),
        })
    }

    async fn fetch_recent_bars(&self, symbol: &Symbol, days: u32) -> Result<DataFrame> {
        let url = self.build_chart_url(symbol, i64::from(days), false);
        let response: ChartResponse = self.get_json(&url, symbol).await?;

        if let Some(error) = response.chart.error {
            if error.code == "Not Found" {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            return Err(DataError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        self.parse_chart_bars(symbol, response)
    }

    async fn fetch_dividends(&self, symbol: &Symbol) -> Result<Vec<DividendPayment>> {
        let url = self.build_chart_url(symbol, DIVIDEND_LOOKBACK_DAYS, true);
        let response: ChartResponse = self.get_json(&url, symbol).await?;

        if let Some(error) = response.chart.error {
            return Err(DataError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let result = response
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

        Ok(parse_dividend_events(&result))
    }
}

/// Assemble a raw statement table from a timeseries response.
///
/// Rows are keyed by the reported `asOfDate` strings (ISO dates, so their
/// lexicographic order is chronological); items the response lacks simply
/// contribute no column.
fn assemble_statement(items: &[(&str, &str)], response: &TimeseriesResponse) -> RawStatement {
    // Collect (key -> asOfDate -> value), later observations overwriting.
    let mut observed: HashMap<&str, HashMap<String, f64>> = HashMap::new();

    for block in &response.timeseries.result {
        let Some(series_type) = block.meta.series_types.first() else {
            continue;
        };
        let Some(value) = block.series.get(series_type.as_str()) else {
            continue;
        };
        let rows: Vec<Option<TimeseriesRow>> =
            serde_json::from_value(value.clone()).unwrap_or_default();

        let Some((key, _)) = items
            .iter()
            .copied()
            .find(|(k, _)| *k == series_type.as_str())
        else {
            continue;
        };

        let entry = observed.entry(key).or_default();
        for row in rows.into_iter().flatten() {
            if let Some(raw) = row.reported_value.and_then(|v| v.raw) {
                entry.insert(row.as_of_date, raw);
            }
        }
    }

    if observed.is_empty() {
        return RawStatement::empty();
    }

    let dates: Vec<String> = observed
        .values()
        .flat_map(|rows| rows.keys().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let mut columns = vec![Column::new(DATE_COLUMN.into(), dates.clone())];
    for (key, label) in items {
        let Some(rows) = observed.get(key) else {
            continue;
        };
        let values: Vec<Option<f64>> = dates.iter().map(|d| rows.get(d).copied()).collect();
        columns.push(Column::new((*label).into(), values));
    }

    DataFrame::new(columns)
        .map(RawStatement::new)
        .unwrap_or_default()
}

/// Extract dividend events from a chart result, sorted ascending by date.
fn parse_dividend_events(result: &ChartData) -> Vec<DividendPayment> {
    let Some(events) = &result.events else {
        return Vec::new();
    };
    let Some(dividends) = &events.dividends else {
        return Vec::new();
    };

    let mut payments: Vec<DividendPayment> = dividends
        .values()
        .filter_map(|event| {
            let date = Utc.timestamp_opt(event.date, 0).single()?.date_naive();
            event.amount.is_finite().then(|| DividendPayment::new(date, event.amount))
        })
        .collect();
    payments.sort_by_key(|p| p.date);
    payments
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Fundamentals-timeseries API response.
#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesResult,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    #[serde(default)]
    result: Vec<TimeseriesData>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesData {
    meta: TimeseriesMeta,
    /// Each block carries its rows under a key named after the series type
    /// (e.g. `"annualTotalRevenue"`), so the payload is captured loosely
    /// and decoded per block.
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    series_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesRow {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue")]
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    result: Vec<ChartData>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
    events: Option<ChartEvents>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    dividends: Option<HashMap<String, DividendEvent>>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

/// Quote summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryData {
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}
