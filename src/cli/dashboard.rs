use super::{transactions, ui};
use crate::core::dashboard::DashboardSnapshot;
use crate::core::ledger::Ledger;
use crate::core::model::{Transaction, TransactionType};
use crate::core::rates::RateTable;
use chrono::{Datelike, Local};
use comfy_table::{Attribute, Cell, Color};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const RECENT_LIMIT: usize = 5;

impl DashboardSnapshot {
    /// Renders the snapshot. `current_month` (1..=12) is highlighted in the
    /// monthly breakdown when given.
    pub fn display_as_table(&self, currency: &str, current_month: Option<u32>) -> String {
        let mut summary = ui::new_styled_table();
        summary.set_header(vec![
            ui::header_cell("Metric"),
            ui::header_cell(&format!("Value ({currency})")),
        ]);
        summary.add_row(vec![
            Cell::new("Portfolio value"),
            ui::money_cell(self.portfolio.totals.total_current_value),
        ]);
        summary.add_row(vec![
            Cell::new("Portfolio cost"),
            ui::money_cell(self.portfolio.totals.total_cost),
        ]);
        summary.add_row(vec![
            Cell::new("Unrealized P/L"),
            ui::pl_cell(self.portfolio_pl),
        ]);
        summary.add_row(vec![
            Cell::new("Unrealized P/L (%)"),
            ui::change_cell(self.portfolio_pl_percent),
        ]);
        summary.add_row(vec![
            Cell::new("Net cash flow (all time)"),
            ui::pl_cell(self.net_cash_flow),
        ]);
        summary.add_row(vec![
            Cell::new(format!("Income {}", self.year)),
            ui::money_cell(self.period_income),
        ]);
        summary.add_row(vec![
            Cell::new(format!("Expense {}", self.year)),
            ui::money_cell(self.period_expense),
        ]);

        let mut monthly = ui::new_styled_table();
        monthly.set_header(vec![
            ui::header_cell("Month"),
            ui::header_cell("Income"),
            ui::header_cell("Expense"),
            ui::header_cell("Net"),
        ]);
        for (number, (name, month)) in (1..).zip(MONTHS.iter().zip(self.monthly.iter())) {
            let name = if current_month == Some(number) {
                Cell::new(*name)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            } else {
                Cell::new(*name)
            };
            monthly.add_row(vec![
                name,
                ui::money_cell(month.income),
                ui::money_cell(month.expense),
                ui::pl_cell(month.net),
            ]);
        }

        let mut output = format!(
            "Dashboard: {}\n\n",
            ui::style_text(&self.year.to_string(), ui::StyleType::Title)
        );
        output.push_str(&summary.to_string());
        output.push_str("\n\n");
        output.push_str(&monthly.to_string());
        if let Some(month) = current_month
            .and_then(|m| m.checked_sub(1))
            .and_then(|index| self.monthly.get(index as usize))
        {
            output.push_str(&format!(
                "\n\n{} income {}  expense {}",
                ui::style_text("This month:", ui::StyleType::TotalLabel),
                ui::format_money(month.income),
                ui::format_money(month.expense)
            ));
        }
        output.push_str(&format!(
            "\n\nTotal Wealth ({}): {}",
            ui::style_text(currency, ui::StyleType::TotalLabel),
            ui::style_total(self.total_wealth)
        ));
        output
    }
}

/// Renders the rates a snapshot was computed with, or a note that holdings
/// are shown at cost.
pub fn display_rates(rates: &RateTable) -> String {
    if rates.is_empty() {
        return ui::style_text(
            "No market rates available, holdings are valued at cost.",
            ui::StyleType::Error,
        );
    }
    let quoted: Vec<String> = rates
        .iter()
        .map(|(kind, rate)| format!("{} {}", kind.display_info().0, ui::format_money(rate)))
        .collect();
    let fetched = rates
        .fetched_at
        .map(|at| format!(" (as of {})", at.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default();
    ui::style_text(
        &format!("Rates: {}{}", quoted.join(", "), fetched),
        ui::StyleType::Subtle,
    )
}

/// Lists the latest transactions, newest first.
pub fn display_recent(all: &[Transaction]) -> String {
    let recent: Vec<&Transaction> = transactions::sorted_for_display(all, None)
        .into_iter()
        .take(RECENT_LIMIT)
        .collect();
    if recent.is_empty() {
        return ui::style_text("No transactions recorded yet.", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Recent"),
        ui::header_cell("Category"),
        ui::header_cell("Amount"),
    ]);
    for transaction in recent {
        let amount = match transaction.kind {
            TransactionType::Income => {
                Cell::new(format!("+{}", ui::format_money(transaction.amount))).fg(Color::Green)
            }
            TransactionType::Expense => {
                Cell::new(format!("-{}", ui::format_money(transaction.amount))).fg(Color::Red)
            }
        };
        table.add_row(vec![
            Cell::new(transaction.date.format("%Y-%m-%d")),
            Cell::new(&transaction.category),
            amount,
        ]);
    }
    table.to_string()
}

pub fn run(ledger: &Ledger, rates: &RateTable, year: i32, currency: &str) {
    let today = Local::now().date_naive();
    let current_month = (today.year() == year).then(|| today.month());

    let snapshot = ledger.dashboard(rates, year);
    println!("{}", snapshot.display_as_table(currency, current_month));
    println!("\n{}", display_recent(ledger.transactions.list()));
    println!("{}", display_rates(rates));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{AssetKind, RecordId, Transaction, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_contains_figures() {
        let ledger = Ledger::new(
            vec![Transaction {
                id: RecordId::from("t"),
                kind: TransactionType::Income,
                category: "Salary".to_string(),
                amount: dec!(1500),
                date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                created_at: None,
            }],
            Vec::new(),
        );
        let output = ledger
            .dashboard(&RateTable::new(), 2024)
            .display_as_table("TRY", None);

        assert!(output.contains("2024"));
        assert!(output.contains("Mar"));
        assert!(output.contains("1500.00"));
        assert!(output.contains("Total Wealth"));
        assert!(!output.contains("This month"));
    }

    #[test]
    fn test_current_month_line() {
        let ledger = Ledger::new(
            vec![Transaction {
                id: RecordId::from("t"),
                kind: TransactionType::Expense,
                category: "Rent".to_string(),
                amount: dec!(750),
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                created_at: None,
            }],
            Vec::new(),
        );
        let snapshot = ledger.dashboard(&RateTable::new(), 2024);

        let output = snapshot.display_as_table("TRY", Some(3));
        assert!(output.contains("This month:"));
        assert!(output.contains("expense 750.00"));
        let output = snapshot.display_as_table("TRY", Some(4));
        assert!(output.contains("expense 0.00"));
    }

    #[test]
    fn test_recent_lists_latest_five() {
        let transactions: Vec<Transaction> = (1..=7)
            .map(|day| Transaction {
                id: RecordId::from(format!("t{day}")),
                kind: if day % 2 == 0 {
                    TransactionType::Expense
                } else {
                    TransactionType::Income
                },
                category: format!("Category{day}"),
                amount: dec!(10),
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                created_at: None,
            })
            .collect();

        let output = display_recent(&transactions);

        assert!(output.contains("2024-05-07"));
        assert!(output.contains("2024-05-03"));
        assert!(!output.contains("2024-05-02"));
        assert!(!output.contains("Category1"));
        assert!(output.contains("+10.00"));
        assert!(output.contains("-10.00"));
        assert!(display_recent(&[]).contains("No transactions recorded yet."));
    }

    #[test]
    fn test_display_rates() {
        assert!(display_rates(&RateTable::new()).contains("valued at cost"));
        let rates = RateTable::new().with_rate(AssetKind::Usd, dec!(32.5));
        assert!(display_rates(&rates).contains("US Dollar 32.50"));
    }
}
