//! The four statement-ratio families.
//!
//! [`compute_ratios`] derives profitability, liquidity, leverage, and
//! efficiency ratios from the two primary statements over a common aligned
//! year index. Everything degrades: a line item a provider never reports
//! produces all-missing ratio columns, never a shrunken index and never an
//! error.

use std::collections::BTreeSet;
use tracing::debug;

use ratios_core::Result;

use crate::math::{
    abs_series, add_series, safe_div_scalar, safe_div_series, sub_series, two_period_average,
};
use crate::normalize::NormalizedStatement;
use crate::series::{RECEIVABLES_ALIASES, TOTAL_EQUITY_ALIASES};
use crate::table::{RatioTable, combined_table};

/// Days per year, the numerator of the days-outstanding ratios.
const DAYS_PER_YEAR: f64 = 365.0;

/// The four ratio families computed from the income statement and balance
/// sheet, all sharing one aligned year index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementRatios {
    /// Margins, returns, and asset turnover.
    pub profitability: RatioTable,
    /// Short-term coverage ratios and working capital.
    pub liquidity: RatioTable,
    /// Debt and interest-coverage ratios.
    pub leverage: RatioTable,
    /// Activity/turnover ratios and the cash conversion cycle.
    pub efficiency: RatioTable,
}

impl StatementRatios {
    /// Returns the aligned year index shared by all four families.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        self.profitability.years()
    }

    /// Joins the four families into the single export table, each column
    /// prefixed by its family name.
    #[must_use]
    pub fn combined(&self) -> RatioTable {
        combined_table(&[
            ("Profitability", &self.profitability),
            ("Liquidity", &self.liquidity),
            ("Leverage", &self.leverage),
            ("Efficiency", &self.efficiency),
        ])
    }

    /// Serializes the combined table as CSV.
    pub fn to_csv(&self) -> Result<String> {
        self.combined().to_csv()
    }
}

/// Computes the four ratio families from normalized statements.
///
/// The aligned year index is the union of the years observed for the anchor
/// items (revenue, net income, EBIT, current assets, current liabilities,
/// total assets, total equity); non-anchor items reindex onto it so that an
/// item missing entirely yields all-missing ratios without shrinking the
/// index.
#[must_use]
pub fn compute_ratios(
    income: &NormalizedStatement,
    balance: &NormalizedStatement,
) -> StatementRatios {
    // Income statement
    let revenue = income.series("Total Revenue");
    let net_income = income.series("Net Income");
    let ebit = income.series("EBIT");
    let interest_expense = income.series("Interest Expense");
    let cogs = income.series("Cost Of Revenue");
    let gross_profit = income.series("Gross Profit");

    // Balance sheet
    let current_assets = balance.series("Current Assets");
    let current_liabilities = balance.series("Current Liabilities");
    let cash_sti = balance.series("Cash Cash Equivalents And Short Term Investments");
    let inventory = balance.series("Inventory");
    let receivables = balance.series_any(RECEIVABLES_ALIASES);
    let payables = balance.series("Accounts Payable");
    let total_assets = balance.series("Total Assets");
    let total_debt = balance.series("Total Debt");
    let total_equity = balance.series_any(TOTAL_EQUITY_ALIASES);

    // Common aligned index across the anchor items.
    let years: Vec<i32> = [
        &revenue,
        &net_income,
        &ebit,
        &current_assets,
        &current_liabilities,
        &total_assets,
        &total_equity,
    ]
    .iter()
    .flat_map(|series| series.years())
    .collect::<BTreeSet<i32>>()
    .into_iter()
    .collect();

    debug!(years = years.len(), "aligned ratio year index");

    let revenue = revenue.reindex(&years);
    let net_income = net_income.reindex(&years);
    let ebit = ebit.reindex(&years);
    let interest_expense = interest_expense.reindex(&years);
    let cogs = cogs.reindex(&years);
    let gross_profit = gross_profit.reindex(&years);
    let current_assets = current_assets.reindex(&years);
    let current_liabilities = current_liabilities.reindex(&years);
    let cash_sti = cash_sti.reindex(&years);
    let inventory = inventory.reindex(&years);
    let receivables = receivables.reindex(&years);
    let payables = payables.reindex(&years);
    let total_assets = total_assets.reindex(&years);
    let total_debt = total_debt.reindex(&years);
    let total_equity = total_equity.reindex(&years);

    // Average balances for ratios that mix a flow with a stock quantity.
    let avg_assets = two_period_average(&total_assets);
    let avg_inventory = two_period_average(&inventory);
    let avg_receivables = two_period_average(&receivables);
    let avg_payables = two_period_average(&payables);
    let avg_equity = two_period_average(&total_equity);

    let mut profitability = RatioTable::new(years.clone());
    profitability.push_column("Gross Margin", safe_div_series(&gross_profit, &revenue));
    profitability.push_column("EBIT Margin", safe_div_series(&ebit, &revenue));
    profitability.push_column("Net Profit Margin", safe_div_series(&net_income, &revenue));
    profitability.push_column("ROA", safe_div_series(&net_income, &avg_assets));
    profitability.push_column("ROE", safe_div_series(&net_income, &avg_equity));
    profitability.push_column("Asset Turnover", safe_div_series(&revenue, &avg_assets));

    let quick_assets = sub_series(&current_assets, &inventory);
    let mut liquidity = RatioTable::new(years.clone());
    liquidity.push_column(
        "Current Ratio",
        safe_div_series(&current_assets, &current_liabilities),
    );
    liquidity.push_column(
        "Quick Ratio",
        safe_div_series(&quick_assets, &current_liabilities),
    );
    liquidity.push_column(
        "Cash Ratio",
        safe_div_series(&cash_sti, &current_liabilities),
    );
    liquidity.push_column(
        "Working Capital",
        sub_series(&current_assets, &current_liabilities),
    );

    let mut leverage = RatioTable::new(years.clone());
    leverage.push_column(
        "Debt to Assets",
        safe_div_series(&total_debt, &total_assets),
    );
    leverage.push_column(
        "Debt to Equity",
        safe_div_series(&total_debt, &total_equity),
    );
    leverage.push_column(
        "Interest Coverage",
        safe_div_series(&ebit, &abs_series(&interest_expense)),
    );

    let inventory_turnover = safe_div_series(&cogs, &avg_inventory);
    let receivables_turnover = safe_div_series(&revenue, &avg_receivables);
    let payables_turnover = safe_div_series(&cogs, &avg_payables);
    let dio = safe_div_scalar(DAYS_PER_YEAR, &inventory_turnover);
    let dso = safe_div_scalar(DAYS_PER_YEAR, &receivables_turnover);
    let dpo = safe_div_scalar(DAYS_PER_YEAR, &payables_turnover);
    let ccc = sub_series(&add_series(&dio, &dso), &dpo);

    let mut efficiency = RatioTable::new(years);
    efficiency.push_column("Inventory Turnover", inventory_turnover);
    efficiency.push_column("Receivables Turnover", receivables_turnover);
    efficiency.push_column("Payables Turnover", payables_turnover);
    efficiency.push_column("Days Inventory Outstanding", dio);
    efficiency.push_column("Days Sales Outstanding", dso);
    efficiency.push_column("Days Payables Outstanding", dpo);
    efficiency.push_column("Cash Conversion Cycle", ccc);

    StatementRatios {
        profitability,
        liquidity,
        leverage,
        efficiency,
    }
}
