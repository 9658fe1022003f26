//! Income and expense rollups over calendar periods.
use crate::core::model::{Transaction, TransactionType};
use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Income and expense of one calendar year, bucketed by month.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    /// January is index 0.
    pub monthly: [MonthSummary; 12],
    pub income: Decimal,
    pub expense: Decimal,
}

impl YearSummary {
    fn empty(year: i32) -> Self {
        YearSummary {
            year,
            monthly: [MonthSummary::default(); 12],
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        }
    }

    /// Summary for `month` in 1..=12.
    pub fn month(&self, month: u32) -> Option<&MonthSummary> {
        month
            .checked_sub(1)
            .and_then(|index| self.monthly.get(index as usize))
    }

    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

/// Sums income and expense per month for transactions dated in `year`.
///
/// Transactions outside the year are ignored, as are entries with a
/// negative amount and entries that would overflow a total.
pub fn aggregate(transactions: &[Transaction], year: i32) -> YearSummary {
    let mut summary = YearSummary::empty(year);

    for transaction in transactions.iter().filter(|t| t.date.year() == year) {
        if transaction.amount < Decimal::ZERO {
            warn!(id = %transaction.id, "Skipping transaction with negative amount");
            continue;
        }
        let month = &mut summary.monthly[transaction.date.month0() as usize];
        let (month_total, year_total) = match transaction.kind {
            TransactionType::Income => (&mut month.income, &mut summary.income),
            TransactionType::Expense => (&mut month.expense, &mut summary.expense),
        };
        match (
            month_total.checked_add(transaction.amount),
            year_total.checked_add(transaction.amount),
        ) {
            (Some(month_sum), Some(year_sum)) => {
                *month_total = month_sum;
                *year_total = year_sum;
            }
            _ => warn!(id = %transaction.id, "Skipping transaction, total overflows"),
        }
    }

    for month in &mut summary.monthly {
        month.net = month.income - month.expense;
    }

    summary
}

/// Income minus expense over every transaction regardless of date.
pub fn lifetime_net_cash_flow(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.amount >= Decimal::ZERO)
        .fold(Decimal::ZERO, |total, t| {
            total.checked_add(t.signed_amount()).unwrap_or_else(|| {
                warn!(id = %t.id, "Skipping transaction, net cash flow overflows");
                total
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::RecordId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionType, amount: Decimal, date: (i32, u32, u32)) -> Transaction {
        Transaction {
            id: RecordId::generate(),
            kind,
            category: "General".to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            created_at: None,
        }
    }

    #[test]
    fn test_year_breakdown() {
        let transactions = vec![
            tx(TransactionType::Income, dec!(1000), (2024, 1, 15)),
            tx(TransactionType::Expense, dec!(300), (2024, 1, 20)),
            tx(TransactionType::Income, dec!(500), (2023, 12, 1)),
        ];

        let summary = aggregate(&transactions, 2024);

        assert_eq!(
            summary.monthly[0],
            MonthSummary {
                income: dec!(1000),
                expense: dec!(300),
                net: dec!(700),
            }
        );
        for month in &summary.monthly[1..] {
            assert_eq!(*month, MonthSummary::default());
        }
        assert_eq!(summary.income, dec!(1000));
        assert_eq!(summary.expense, dec!(300));
        assert_eq!(summary.net(), dec!(700));
        assert_eq!(summary.month(1), Some(&summary.monthly[0]));
        assert_eq!(summary.month(0), None);
        assert_eq!(summary.month(13), None);
    }

    #[test]
    fn test_empty_year() {
        let summary = aggregate(&[], 1999);
        assert_eq!(summary.year, 1999);
        assert!(summary.monthly.iter().all(|m| *m == MonthSummary::default()));
        assert_eq!(summary.income, Decimal::ZERO);
        assert_eq!(summary.expense, Decimal::ZERO);
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut transactions = vec![
            tx(TransactionType::Expense, dec!(12.5), (2024, 12, 31)),
            tx(TransactionType::Income, dec!(100), (2024, 6, 1)),
            tx(TransactionType::Income, dec!(50), (2024, 12, 1)),
        ];
        let forward = aggregate(&transactions, 2024);
        transactions.reverse();
        let backward = aggregate(&transactions, 2024);

        assert_eq!(forward, backward);
        assert_eq!(forward.monthly[11].net, dec!(37.5));
        assert_eq!(forward.monthly[5].income, dec!(100));
    }

    #[test]
    fn test_lifetime_net_cash_flow_spans_years() {
        let transactions = vec![
            tx(TransactionType::Income, dec!(1000), (2024, 1, 15)),
            tx(TransactionType::Expense, dec!(300), (2024, 1, 20)),
            tx(TransactionType::Income, dec!(500), (2023, 12, 1)),
            tx(TransactionType::Expense, dec!(-40), (2023, 12, 2)),
        ];
        assert_eq!(lifetime_net_cash_flow(&transactions), dec!(1200));
        assert_eq!(lifetime_net_cash_flow(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_amounts_are_skipped() {
        let huge = dec!(50000000000000000000000000000);
        let transactions = vec![
            tx(TransactionType::Income, huge, (2024, 1, 15)),
            tx(TransactionType::Income, huge, (2024, 1, 16)),
            tx(TransactionType::Income, huge, (2024, 2, 1)),
            tx(TransactionType::Expense, dec!(10), (2024, 2, 2)),
        ];

        let summary = aggregate(&transactions, 2024);

        assert_eq!(summary.monthly[0].income, huge);
        assert_eq!(summary.monthly[1].income, Decimal::ZERO);
        assert_eq!(summary.monthly[1].expense, dec!(10));
        assert_eq!(summary.income, huge);
        assert_eq!(summary.net(), huge - dec!(10));
        assert_eq!(lifetime_net_cash_flow(&transactions), huge - dec!(10));
    }
}
