use super::ui;
use crate::core::model::{RecordId, Transaction, TransactionDraft, TransactionType};
use crate::core::session::Session;
use anyhow::Result;
use chrono::Datelike;
use comfy_table::{Cell, Color};
use rust_decimal::Decimal;

/// Transaction fields given on the command line. Unset fields keep their
/// current value on edit.
#[derive(Debug, Clone, Default)]
pub struct TransactionFields {
    pub kind: Option<String>,
    pub category: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
}

impl TransactionFields {
    fn into_draft(self) -> TransactionDraft {
        TransactionDraft {
            kind: self.kind.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            amount: self.amount.unwrap_or_default(),
            date: self.date.unwrap_or_else(super::today),
        }
    }

    fn merge_into_draft(self, current: &Transaction) -> TransactionDraft {
        TransactionDraft {
            kind: self.kind.unwrap_or_else(|| current.kind.to_string()),
            category: self.category.unwrap_or_else(|| current.category.clone()),
            amount: self.amount.unwrap_or_else(|| current.amount.to_string()),
            date: self
                .date
                .unwrap_or_else(|| current.date.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TransactionCommand {
    Add(TransactionFields),
    Edit {
        id: String,
        fields: TransactionFields,
    },
    Remove {
        id: String,
    },
    List {
        year: Option<i32>,
    },
}

/// Newest first; ties keep ledger order.
pub(crate) fn sorted_for_display(transactions: &[Transaction], year: Option<i32>) -> Vec<&Transaction> {
    let mut rows: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| year.is_none_or(|y| t.date.year() == y))
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

pub fn display_as_table(transactions: &[Transaction], year: Option<i32>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Type"),
        ui::header_cell("Category"),
        ui::header_cell("Amount"),
        ui::header_cell("Id"),
    ]);

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for transaction in sorted_for_display(transactions, year) {
        let amount = match transaction.kind {
            TransactionType::Income => {
                income = income.saturating_add(transaction.amount);
                ui::money_cell(transaction.amount).fg(Color::Green)
            }
            TransactionType::Expense => {
                expense = expense.saturating_add(transaction.amount);
                ui::money_cell(transaction.amount).fg(Color::Red)
            }
        };
        table.add_row(vec![
            Cell::new(transaction.date.format("%Y-%m-%d")),
            Cell::new(transaction.kind.to_string()),
            Cell::new(&transaction.category),
            amount,
            Cell::new(ui::style_text(
                transaction.id.as_str(),
                ui::StyleType::Subtle,
            )),
        ]);
    }

    let mut output = table.to_string();
    output.push_str(&format!(
        "\n\n{} {}  {} {}  {} {}",
        ui::style_text("Income:", ui::StyleType::TotalLabel),
        ui::format_money(income),
        ui::style_text("Expense:", ui::StyleType::TotalLabel),
        ui::format_money(expense),
        ui::style_text("Net:", ui::StyleType::TotalLabel),
        ui::style_total(income - expense)
    ));
    output
}

pub async fn run(session: &mut Session, command: TransactionCommand) -> Result<()> {
    match command {
        TransactionCommand::Add(fields) => {
            let id = session.add_transaction(fields.into_draft()).await?;
            println!("Added transaction {id}");
        }
        TransactionCommand::Edit { id, fields } => {
            let id = RecordId::from(id);
            let draft = match session.ledger().transactions.get(&id) {
                Some(current) => fields.merge_into_draft(current),
                None => fields.into_draft(),
            };
            session.update_transaction(&id, draft).await?;
            println!("Updated transaction {id}");
        }
        TransactionCommand::Remove { id } => {
            let id = RecordId::from(id);
            session.delete_transaction(&id).await?;
            println!("Removed transaction {id}");
        }
        TransactionCommand::List { year } => {
            println!(
                "{}",
                display_as_table(session.ledger().transactions.list(), year)
            );
        }
    }
    Ok(())
}
