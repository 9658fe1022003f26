use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::{Decimal, RoundingStrategy};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Two decimal places, rounded half away from zero.
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", round_cents(value))
}

/// Right-aligned money cell.
pub fn money_cell(value: Decimal) -> Cell {
    Cell::new(format_money(value)).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

fn signed_color(value: Decimal) -> Color {
    if value.is_sign_negative() && !value.is_zero() {
        Color::Red
    } else {
        Color::Green
    }
}

/// Profit/loss amount, colored by sign.
pub fn pl_cell(value: Decimal) -> Cell {
    Cell::new(format_money(value))
        .fg(signed_color(value))
        .set_alignment(CellAlignment::Right)
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: Option<Decimal>) -> Cell {
    match change {
        Some(change) => Cell::new(format_percent(change))
            .fg(signed_color(change))
            .set_alignment(CellAlignment::Right),
        None => format_optional_cell(None::<Decimal>, format_money),
    }
}

/// Styles a total for the summary lines under a table.
pub fn style_total(value: Decimal) -> String {
    let text = format_money(value);
    if value.is_sign_negative() && !value.is_zero() {
        style_text(&text, StyleType::Error)
    } else {
        style_text(&text, StyleType::TotalValue)
    }
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
