//! End-to-end ratio analysis for a ticker.

use std::sync::Arc;

use tracing::{debug, warn};

use ratios_core::{
    DataError, MarketDataProvider, Result, StatementBundle, StatementCache, StatementProvider,
    Symbol,
};
use ratios_engine::{
    MarketInputs, MarketRatios, NormalizedStatement, RatioTable, StatementRatios,
    compute_market_ratios, compute_ratios, last_close, normalize_statement,
};

/// Days of daily bars fetched when the live quote has no usable price.
const PRICE_FALLBACK_DAYS: u32 = 5;

/// Orchestrates statement fetching, normalization, and ratio computation.
///
/// The analyzer owns no I/O of its own: the statement provider, the
/// optional market-data provider, and the optional cache are injected
/// capabilities. Statement fetches go cache-first; a failed cache write is
/// logged and ignored.
pub struct RatioAnalyzer {
    statements: Arc<dyn StatementProvider>,
    market: Option<Arc<dyn MarketDataProvider>>,
    cache: Option<Arc<dyn StatementCache>>,
}

impl std::fmt::Debug for RatioAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatioAnalyzer")
            .field("statements", &self.statements.name())
            .field("market", &self.market.as_ref().map(|p| p.name()))
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .finish()
    }
}

impl RatioAnalyzer {
    /// Creates an analyzer over a statement provider, with no market data
    /// and no cache.
    #[must_use]
    pub fn new(statements: Arc<dyn StatementProvider>) -> Self {
        Self {
            statements,
            market: None,
            cache: None,
        }
    }

    /// Adds a market-data provider, enabling the market-ratio block.
    #[must_use]
    pub fn with_market(mut self, provider: Arc<dyn MarketDataProvider>) -> Self {
        self.market = Some(provider);
        self
    }

    /// Adds a statement cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn StatementCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Adds an in-memory statement cache with the default 30-minute TTL.
    #[must_use]
    pub fn with_default_cache(self) -> Self {
        self.with_cache(Arc::new(ratios_cache::InMemoryCache::new()))
    }

    /// Creates an analyzer backed by Yahoo Finance for both statements and
    /// market data.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn yahoo() -> Self {
        let provider = Arc::new(ratios_yahoo::YahooProvider::new());
        Self::new(provider.clone()).with_market(provider)
    }

    /// Runs the full analysis for a ticker.
    ///
    /// Fetches (or re-uses cached) statements, normalizes them, and computes
    /// the four ratio families. The market-ratio block is attempted only if
    /// a market provider is configured; any failure there is downgraded to a
    /// note on the report and never aborts the statement families.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InsufficientStatements`] when the income
    /// statement and balance sheet are both empty (the one terminal
    /// condition), and propagates provider errors from the statement fetch.
    pub async fn analyze(&self, symbol: &Symbol) -> Result<RatioReport> {
        let bundle = self.load_statements(symbol).await?;

        let income = normalize_statement(&bundle.income);
        let balance = normalize_statement(&bundle.balance);
        let cash_flow = normalize_statement(&bundle.cash_flow);

        if income.is_empty() && balance.is_empty() {
            return Err(DataError::InsufficientStatements(symbol.to_string()));
        }

        let ratios = compute_ratios(&income, &balance);

        let (market, market_note) = match &self.market {
            Some(provider) => {
                match self.gather_market_inputs(provider.as_ref(), symbol).await {
                    Ok(inputs) => (
                        Some(compute_market_ratios(&income, &balance, &inputs)),
                        None,
                    ),
                    Err(e) => {
                        warn!(%symbol, error = %e, "market ratio data incomplete");
                        (None, Some(format!("Market ratio data incomplete: {e}")))
                    }
                }
            }
            None => (None, None),
        };

        Ok(RatioReport {
            symbol: symbol.clone(),
            income,
            balance,
            cash_flow,
            ratios,
            market,
            market_note,
        })
    }

    /// Loads the statement bundle, cache-first.
    async fn load_statements(&self, symbol: &Symbol) -> Result<StatementBundle> {
        if let Some(cache) = &self.cache {
            if let Ok(Some(cached)) = cache.get_statements(symbol).await {
                debug!(%symbol, "Cache hit for statements");
                return Ok(cached);
            }
        }

        debug!(
            provider = self.statements.name(),
            %symbol,
            "Fetching statements"
        );
        let bundle = self.statements.fetch_statements(symbol).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put_statements(symbol, &bundle).await {
                warn!(%symbol, error = %e, "Failed to cache statements");
            }
        }

        Ok(bundle)
    }

    /// Gathers the inputs of the market-ratio block from the provider.
    ///
    /// Recent bars are only fetched when the live quote carries no usable
    /// price.
    async fn gather_market_inputs(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &Symbol,
    ) -> Result<MarketInputs> {
        let quote = provider.fetch_quote(symbol).await?;

        let fallback_price = if quote.last_price.filter(|p| p.is_finite()).is_none() {
            let bars = provider.fetch_recent_bars(symbol, PRICE_FALLBACK_DAYS).await?;
            last_close(&bars)
        } else {
            None
        };

        let dividends = provider.fetch_dividends(symbol).await?;

        Ok(MarketInputs {
            quote,
            fallback_price,
            dividends,
        })
    }
}

/// The full result of analyzing one ticker.
#[derive(Clone, Debug)]
pub struct RatioReport {
    /// The analyzed ticker.
    pub symbol: Symbol,
    /// Normalized income statement.
    pub income: NormalizedStatement,
    /// Normalized balance sheet.
    pub balance: NormalizedStatement,
    /// Normalized cash-flow statement (displayed, not used in ratio math).
    pub cash_flow: NormalizedStatement,
    /// The four statement-ratio families.
    pub ratios: StatementRatios,
    /// Market-ratio block, when a market provider was configured and its
    /// data was available.
    pub market: Option<MarketRatios>,
    /// Informational note when the market block failed; the statement
    /// families are unaffected.
    pub market_note: Option<String>,
}

impl RatioReport {
    /// Joins the four ratio families into the single export table.
    #[must_use]
    pub fn combined(&self) -> RatioTable {
        self.ratios.combined()
    }

    /// Serializes the combined ratio table as CSV.
    pub fn to_csv(&self) -> Result<String> {
        self.ratios.to_csv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use polars::prelude::*;
    use ratios_cache::InMemoryCache;
    use ratios_core::{DataProvider, DividendPayment, Quote, RawStatement};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw_statement(items: Vec<(&str, Vec<Option<f64>>)>) -> RawStatement {
        let mut cols = vec![Column::new(
            "date".into(),
            vec!["2022-12-31", "2023-12-31"],
        )];
        for (name, values) in items {
            cols.push(Column::new(name.into(), values));
        }
        RawStatement::new(DataFrame::new(cols).unwrap())
    }

    fn sample_bundle(symbol: &Symbol) -> StatementBundle {
        StatementBundle {
            symbol: symbol.clone(),
            income: raw_statement(vec![
                ("Total Revenue", vec![Some(1000.0), Some(1200.0)]),
                ("Net Income", vec![Some(100.0), Some(150.0)]),
                ("Basic EPS", vec![Some(4.0), Some(5.0)]),
            ]),
            balance: raw_statement(vec![
                ("Total Assets", vec![Some(2000.0), Some(2400.0)]),
                ("Current Assets", vec![Some(500.0), Some(500.0)]),
                ("Current Liabilities", vec![Some(250.0), Some(250.0)]),
            ]),
            cash_flow: RawStatement::empty(),
        }
    }

    #[derive(Debug)]
    struct StaticStatements {
        bundle: StatementBundle,
        fetches: AtomicUsize,
    }

    impl StaticStatements {
        fn new(bundle: StatementBundle) -> Self {
            Self {
                bundle,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl DataProvider for StaticStatements {
        fn name(&self) -> &str {
            "static"
        }

        fn description(&self) -> &str {
            "canned statements for tests"
        }
    }

    #[async_trait]
    impl StatementProvider for StaticStatements {
        async fn fetch_statements(&self, _symbol: &Symbol) -> Result<StatementBundle> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.bundle.clone())
        }
    }

    #[derive(Debug)]
    struct StaticMarket;

    impl DataProvider for StaticMarket {
        fn name(&self) -> &str {
            "static-market"
        }

        fn description(&self) -> &str {
            "canned market data for tests"
        }
    }

    #[async_trait]
    impl MarketDataProvider for StaticMarket {
        async fn fetch_quote(&self, _symbol: &Symbol) -> Result<Quote> {
            Ok(Quote::new(100.0, 1_000_000.0))
        }

        async fn fetch_recent_bars(&self, _symbol: &Symbol, _days: u32) -> Result<DataFrame> {
            Ok(DataFrame::empty())
        }

        async fn fetch_dividends(&self, _symbol: &Symbol) -> Result<Vec<DividendPayment>> {
            Ok(Vec::new())
        }
    }

    #[derive(Debug)]
    struct FailingMarket;

    impl DataProvider for FailingMarket {
        fn name(&self) -> &str {
            "failing-market"
        }

        fn description(&self) -> &str {
            "always errors"
        }
    }

    #[async_trait]
    impl MarketDataProvider for FailingMarket {
        async fn fetch_quote(&self, _symbol: &Symbol) -> Result<Quote> {
            Err(DataError::Network("connection refused".to_string()))
        }

        async fn fetch_recent_bars(&self, _symbol: &Symbol, _days: u32) -> Result<DataFrame> {
            Err(DataError::Network("connection refused".to_string()))
        }

        async fn fetch_dividends(&self, _symbol: &Symbol) -> Result<Vec<DividendPayment>> {
            Err(DataError::Network("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let symbol = Symbol::new("TEST");
        let analyzer =
            RatioAnalyzer::new(Arc::new(StaticStatements::new(sample_bundle(&symbol))));

        let report = analyzer.analyze(&symbol).await.unwrap();
        assert_eq!(report.ratios.years(), &[2022, 2023]);

        let roa = report.ratios.profitability.get(2023, "ROA").unwrap();
        assert!((roa - 150.0 / 2200.0).abs() < 1e-12);
        assert_eq!(
            report.ratios.liquidity.get(2023, "Current Ratio"),
            Some(2.0)
        );
        assert!(report.market.is_none());
        assert!(report.market_note.is_none());

        let csv = report.to_csv().unwrap();
        assert!(csv.starts_with("Year,Profitability: Gross Margin"));
    }

    #[tokio::test]
    async fn test_both_statements_empty_is_terminal() {
        let symbol = Symbol::new("EMPTY");
        let analyzer = RatioAnalyzer::new(Arc::new(StaticStatements::new(
            StatementBundle::new(symbol.clone()),
        )));

        let err = analyzer.analyze(&symbol).await.unwrap_err();
        assert!(matches!(err, DataError::InsufficientStatements(_)));
    }

    #[tokio::test]
    async fn test_one_statement_is_enough() {
        let symbol = Symbol::new("HALF");
        let bundle = StatementBundle {
            symbol: symbol.clone(),
            income: raw_statement(vec![("Total Revenue", vec![Some(1.0), Some(2.0)])]),
            balance: RawStatement::empty(),
            cash_flow: RawStatement::empty(),
        };
        let analyzer = RatioAnalyzer::new(Arc::new(StaticStatements::new(bundle)));

        let report = analyzer.analyze(&symbol).await.unwrap();
        assert_eq!(report.ratios.years(), &[2022, 2023]);
        assert!(report.balance.is_empty());
    }

    #[tokio::test]
    async fn test_market_failure_does_not_abort_families() {
        let symbol = Symbol::new("TEST");
        let analyzer =
            RatioAnalyzer::new(Arc::new(StaticStatements::new(sample_bundle(&symbol))))
                .with_market(Arc::new(FailingMarket));

        let report = analyzer.analyze(&symbol).await.unwrap();
        assert!(report.market.is_none());
        let note = report.market_note.unwrap();
        assert!(note.contains("connection refused"));
        // The families are unaffected.
        assert_eq!(
            report.ratios.liquidity.get(2023, "Current Ratio"),
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn test_market_block_computed_when_available() {
        let symbol = Symbol::new("TEST");
        let analyzer =
            RatioAnalyzer::new(Arc::new(StaticStatements::new(sample_bundle(&symbol))))
                .with_market(Arc::new(StaticMarket));

        let report = analyzer.analyze(&symbol).await.unwrap();
        let market = report.market.unwrap();
        assert_eq!(market.price, Some(100.0));
        // Latest EPS is 5.0, price 100 => P/E 20.
        assert_eq!(market.pe, Some(20.0));
        assert!(report.market_note.is_none());
    }

    #[tokio::test]
    async fn test_cache_short_circuits_second_fetch() {
        let symbol = Symbol::new("TEST");
        let provider = Arc::new(StaticStatements::new(sample_bundle(&symbol)));
        let analyzer = RatioAnalyzer::new(provider.clone())
            .with_cache(Arc::new(InMemoryCache::new()));

        analyzer.analyze(&symbol).await.unwrap();
        analyzer.analyze(&symbol).await.unwrap();

        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    }
}
