//! Dashboard figures combining holdings and cash flow.
use crate::core::aggregation::{self, MonthSummary};
use crate::core::model::{Asset, Transaction};
use crate::core::rates::RateTable;
use crate::core::valuation::{self, PortfolioValuation};
use rust_decimal::Decimal;

/// Everything the dashboard view shows, recomputed from scratch on every
/// change.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub year: i32,
    /// Current value of all holdings plus lifetime net cash flow.
    pub total_wealth: Decimal,
    pub net_cash_flow: Decimal,
    pub portfolio: PortfolioValuation,
    pub portfolio_pl: Decimal,
    pub portfolio_pl_percent: Option<Decimal>,
    pub period_income: Decimal,
    pub period_expense: Decimal,
    pub monthly: [MonthSummary; 12],
}

/// Builds the dashboard for `year`.
///
/// Total wealth uses cash flow over all transactions, so it does not change
/// with the selected year; only the income/expense breakdown does. It
/// saturates at the largest representable amount.
pub fn compose(
    assets: &[Asset],
    rates: &RateTable,
    transactions: &[Transaction],
    year: i32,
) -> DashboardSnapshot {
    let portfolio = valuation::valuate(assets, rates);
    let period = aggregation::aggregate(transactions, year);
    let net_cash_flow = aggregation::lifetime_net_cash_flow(transactions);

    DashboardSnapshot {
        year,
        total_wealth: portfolio
            .totals
            .total_current_value
            .saturating_add(net_cash_flow),
        net_cash_flow,
        portfolio_pl: portfolio.totals.total_pl,
        portfolio_pl_percent: portfolio.totals.total_pl_percent,
        portfolio,
        period_income: period.income,
        period_expense: period.expense,
        monthly: period.monthly,
    }
}
