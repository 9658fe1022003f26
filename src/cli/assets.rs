use super::ui;
use crate::core::model::{Asset, AssetDraft, RecordId, custodian_name};
use crate::core::rates::RateTable;
use crate::core::session::Session;
use crate::core::valuation::{PortfolioValuation, ValuationBasis};
use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::Decimal;

/// Asset fields given on the command line. Unset fields keep their current
/// value on edit.
#[derive(Debug, Clone, Default)]
pub struct AssetFields {
    pub kind: Option<String>,
    pub custodian: Option<String>,
    pub quantity: Option<String>,
    pub unit_cost: Option<String>,
    pub date: Option<String>,
}

impl AssetFields {
    fn into_draft(self) -> AssetDraft {
        AssetDraft {
            kind: self.kind.unwrap_or_default(),
            custodian: self.custodian,
            quantity: self.quantity.unwrap_or_default(),
            unit_cost: self.unit_cost,
            date: self.date.unwrap_or_else(super::today),
        }
    }

    fn merge_into_draft(self, current: &Asset) -> AssetDraft {
        AssetDraft {
            kind: self.kind.unwrap_or_else(|| current.kind.to_string()),
            custodian: self.custodian.or_else(|| current.custodian.clone()),
            quantity: self
                .quantity
                .unwrap_or_else(|| current.quantity.to_string()),
            unit_cost: self
                .unit_cost
                .or_else(|| Some(current.unit_cost.to_string())),
            date: self
                .date
                .unwrap_or_else(|| current.acquisition_date.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AssetCommand {
    Add(AssetFields),
    Edit { id: String, fields: AssetFields },
    Remove { id: String },
    List,
}

pub fn display_as_table(
    assets: &[Asset],
    valuation: &PortfolioValuation,
    currency: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Custodian"),
        ui::header_cell("Quantity"),
        ui::header_cell("Unit Cost"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Cost ({currency})")),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell("P/L"),
        ui::header_cell("P/L (%)"),
        ui::header_cell("Date"),
        ui::header_cell("Id"),
    ]);

    for asset in assets {
        let (name, unit) = asset.kind.display_info();
        let custodian = asset
            .custodian
            .as_deref()
            .map(custodian_name)
            .unwrap_or("-");
        let quantity = if unit.is_empty() {
            asset.quantity.normalize().to_string()
        } else {
            format!("{} {unit}", asset.quantity.normalize())
        };

        let mut row = vec![
            Cell::new(name),
            Cell::new(custodian),
            Cell::new(quantity),
            ui::money_cell(asset.unit_cost),
        ];
        match valuation.get(&asset.id) {
            Some(value) => {
                let rate = match value.basis {
                    ValuationBasis::Market(rate) => Some(rate),
                    ValuationBasis::Cash => Some(Decimal::ONE),
                    ValuationBasis::Cost => None,
                };
                row.push(ui::format_optional_cell(rate, ui::format_money));
                row.push(ui::money_cell(value.cost));
                row.push(ui::money_cell(value.current_value));
                row.push(ui::pl_cell(value.pl));
                row.push(ui::change_cell(value.pl_percent));
            }
            None => {
                for _ in 0..5 {
                    row.push(ui::format_optional_cell(None::<String>, |s| s));
                }
            }
        }
        row.push(Cell::new(asset.acquisition_date.format("%Y-%m-%d")));
        row.push(Cell::new(ui::style_text(
            asset.id.as_str(),
            ui::StyleType::Subtle,
        )));
        table.add_row(row);
    }

    let totals = &valuation.totals;
    let mut output = table.to_string();
    output.push_str(&format!(
        "\n\nTotal Value ({}): {}",
        ui::style_text(currency, ui::StyleType::TotalLabel),
        ui::style_total(totals.total_current_value)
    ));
    output.push_str(&format!(
        "\nUnrealized P/L: {} ({})",
        ui::style_total(totals.total_pl),
        totals
            .total_pl_percent
            .map_or("N/A".to_string(), ui::format_percent)
    ));
    output
}

pub async fn run(
    session: &mut Session,
    command: AssetCommand,
    rates: Option<&RateTable>,
    currency: &str,
) -> Result<()> {
    match command {
        AssetCommand::Add(fields) => {
            let id = session.add_asset(fields.into_draft()).await?;
            println!("Added asset {id}");
        }
        AssetCommand::Edit { id, fields } => {
            let id = RecordId::from(id);
            let draft = match session.ledger().assets.get(&id) {
                Some(current) => fields.merge_into_draft(current),
                None => fields.into_draft(),
            };
            session.update_asset(&id, draft).await?;
            println!("Updated asset {id}");
        }
        AssetCommand::Remove { id } => {
            let id = RecordId::from(id);
            session.delete_asset(&id).await?;
            println!("Removed asset {id}");
        }
        AssetCommand::List => {
            let empty = RateTable::new();
            let rates = rates.unwrap_or(&empty);
            let ledger = session.ledger();
            let valuation = ledger.valuation(rates);
            println!(
                "{}",
                display_as_table(ledger.assets.list(), &valuation, currency)
            );
        }
    }
    Ok(())
}
